//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{User, UserStatus};
use domain::services::DirectoryError;
use sqlx::FromRow;
use uuid::Uuid;

/// Columns selected for a [`UserEntity`].
pub const USER_COLUMNS: &str =
    "id, name, username, email, status, admin, password_hash, image_url, created_at, last_login_at";

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub status: i16,
    pub admin: bool,
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserEntity> for User {
    type Error = DirectoryError;

    fn try_from(entity: UserEntity) -> Result<Self, Self::Error> {
        let status = UserStatus::from_code(entity.status).ok_or_else(|| {
            DirectoryError::Corrupt(format!(
                "user {} has unknown status {}",
                entity.id, entity.status
            ))
        })?;

        Ok(Self {
            id: entity.id,
            name: entity.name,
            username: entity.username,
            email: entity.email,
            status,
            admin: entity.admin,
            password_hash: entity.password_hash,
            image_url: entity.image_url,
            created_at: entity.created_at,
            last_login_at: entity.last_login_at,
        })
    }
}
