//! Repositories for database access.
//!
//! Each repository wraps a shared connection. Functions suffixed `_in` take
//! any connection instead, so relation hooks can read inside the transaction
//! of the change they are checking.

pub mod course;
pub mod module;
pub mod post;
pub mod report;
pub mod tag;
pub mod university;
pub mod user;

pub use course::CourseRepository;
pub use module::ModuleRepository;
pub use post::{PostFilter, PostRepository};
pub use report::ReportRepository;
pub use tag::{TagKind, TagRecord, TagRepository};
pub use university::UniversityRepository;
pub use user::UserRepository;
