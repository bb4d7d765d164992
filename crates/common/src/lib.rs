//! Common utilities and shared types for RateMyModule.
//!
//! This crate provides foundational components used across all RateMyModule crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Email addresses**: Splitting, normalisation and domain-suffix helpers
//!
//! # Example
//!
//! ```no_run
//! use ratemymodule_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {} on port {}", id, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod email;
pub mod error;
pub mod id;

pub use config::Config;
pub use email::{domain_name, domain_suffixes, normalize_email, registrable_domain, split_email};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
