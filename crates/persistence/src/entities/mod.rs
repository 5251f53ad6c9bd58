//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod config;
pub mod page;
pub mod user;

pub use config::ConfigEntity;
pub use page::PageEntity;
pub use user::{UserEntity, USER_COLUMNS};
