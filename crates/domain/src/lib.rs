//! Domain layer for the wiki admin backend.
//!
//! This crate contains:
//! - Domain models (User, Page, customize and site settings)
//! - The user-list query builder and page-list limit resolution
//! - Directory traits implemented by the persistence layer

pub mod models;
pub mod services;
