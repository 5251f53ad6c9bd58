//! Repository implementations of the domain directory traits.

pub mod config;
pub mod page;
pub mod user;

pub use config::ConfigRepository;
pub use page::PageRepository;
pub use user::UserRepository;

use domain::services::DirectoryError;

pub(crate) fn db_error(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Database(err.to_string())
}
