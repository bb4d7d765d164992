//! Database entities.
//!
//! Entity tables plus one join table per many-to-many relation. Join tables
//! carry only the two foreign keys as a composite primary key.

#![allow(missing_docs)]

pub mod course;
pub mod module;
pub mod module_course;
pub mod other_tag;
pub mod post;
pub mod post_other_tag;
pub mod post_tool_tag;
pub mod post_topic_tag;
pub mod report;
pub mod tool_tag;
pub mod topic_tag;
pub mod university;
pub mod user;
pub mod user_disliked_post;
pub mod user_enrolled_course;
pub mod user_liked_post;

pub use course::Entity as Course;
pub use module::Entity as Module;
pub use module_course::Entity as ModuleCourse;
pub use other_tag::Entity as OtherTag;
pub use post::Entity as Post;
pub use post_other_tag::Entity as PostOtherTag;
pub use post_tool_tag::Entity as PostToolTag;
pub use post_topic_tag::Entity as PostTopicTag;
pub use report::Entity as Report;
pub use tool_tag::Entity as ToolTag;
pub use topic_tag::Entity as TopicTag;
pub use university::Entity as University;
pub use user::Entity as User;
pub use user_disliked_post::Entity as UserDislikedPost;
pub use user_enrolled_course::Entity as UserEnrolledCourse;
pub use user_liked_post::Entity as UserLikedPost;
