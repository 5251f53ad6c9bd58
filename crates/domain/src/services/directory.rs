//! Data access traits used by the admin API.
//!
//! The persistence crate implements these over PostgreSQL. Handlers only see
//! the traits, so tests can swap in in-memory directories.

use serde_json::Value;
use shared::pagination::Paginated;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    NewInvitedUser, Page, PageRange, User, UserListFilter, UserListOptions, UserStatus,
};

/// Failure inside a directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Other(String),
}

/// User accounts.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns one page of users matching `filter`.
    async fn paginate(
        &self,
        filter: &UserListFilter,
        options: &UserListOptions,
    ) -> Result<Paginated<User>, DirectoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;

    /// Creates invited accounts. Addresses that already belong to an
    /// account are skipped, so the result may be shorter than `users`.
    async fn create_invited_users(
        &self,
        users: &[NewInvitedUser],
    ) -> Result<Vec<User>, DirectoryError>;

    /// Returns `None` when no user has `id`.
    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<Option<User>, DirectoryError>;

    async fn set_status(&self, id: Uuid, status: UserStatus)
        -> Result<Option<User>, DirectoryError>;

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, DirectoryError>;
}

/// Wiki pages.
#[async_trait::async_trait]
pub trait PageDirectory: Send + Sync {
    /// Pages created by `creator` that `viewer` may see, newest first,
    /// excluding trashed pages.
    async fn find_list_by_creator(
        &self,
        creator: &User,
        viewer: Option<Uuid>,
        range: PageRange,
    ) -> Result<Vec<Page>, DirectoryError>;
}

/// Key-value settings in the `crowi` namespace.
#[async_trait::async_trait]
pub trait ConfigLookup: Send + Sync {
    /// Returns the stored value, or `None` when the key was never set.
    async fn get_config(&self, key: &str) -> Result<Option<Value>, DirectoryError>;

    /// Upserts every entry atomically.
    async fn update_configs(&self, entries: Vec<(String, Value)>) -> Result<(), DirectoryError>;
}
