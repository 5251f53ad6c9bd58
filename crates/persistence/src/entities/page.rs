//! Page entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Page, PageGrant, User, UserStatus};
use domain::services::DirectoryError;
use sqlx::FromRow;
use uuid::Uuid;

/// A page row joined with its last editor. The `lu_*` columns are all
/// null when the page has no recorded editor.
#[derive(Debug, Clone, FromRow)]
pub struct PageEntity {
    pub id: Uuid,
    pub path: String,
    pub creator_id: Uuid,
    pub grant_type: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lu_id: Option<Uuid>,
    pub lu_name: Option<String>,
    pub lu_username: Option<String>,
    pub lu_email: Option<String>,
    pub lu_status: Option<i16>,
    pub lu_admin: Option<bool>,
    pub lu_image_url: Option<String>,
    pub lu_created_at: Option<DateTime<Utc>>,
    pub lu_last_login_at: Option<DateTime<Utc>>,
}

impl PageEntity {
    fn last_update_user(&self) -> Option<User> {
        let id = self.lu_id?;
        Some(User {
            id,
            name: self.lu_name.clone().unwrap_or_default(),
            username: self.lu_username.clone(),
            email: self.lu_email.clone().unwrap_or_default(),
            status: self
                .lu_status
                .and_then(UserStatus::from_code)
                .unwrap_or(UserStatus::Active),
            admin: self.lu_admin.unwrap_or(false),
            password_hash: None,
            image_url: self.lu_image_url.clone(),
            created_at: self.lu_created_at.unwrap_or(self.created_at),
            last_login_at: self.lu_last_login_at,
        })
    }
}

impl TryFrom<PageEntity> for Page {
    type Error = DirectoryError;

    fn try_from(entity: PageEntity) -> Result<Self, Self::Error> {
        let grant = PageGrant::from_code(entity.grant_type).ok_or_else(|| {
            DirectoryError::Corrupt(format!(
                "page {} has unknown grant {}",
                entity.id, entity.grant_type
            ))
        })?;
        let last_update_user = entity.last_update_user();

        Ok(Self {
            id: entity.id,
            path: entity.path,
            creator_id: entity.creator_id,
            grant,
            last_update_user,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
