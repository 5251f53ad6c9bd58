//! Wiki page domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{PublicUser, User};

/// Who may see a page. Stored as a numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum PageGrant {
    Public,
    Restricted,
    Specified,
    Owner,
    UserGroup,
}

impl PageGrant {
    pub fn code(self) -> i16 {
        match self {
            PageGrant::Public => 1,
            PageGrant::Restricted => 2,
            PageGrant::Specified => 3,
            PageGrant::Owner => 4,
            PageGrant::UserGroup => 5,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(PageGrant::Public),
            2 => Some(PageGrant::Restricted),
            3 => Some(PageGrant::Specified),
            4 => Some(PageGrant::Owner),
            5 => Some(PageGrant::UserGroup),
            _ => None,
        }
    }
}

impl From<PageGrant> for i16 {
    fn from(grant: PageGrant) -> Self {
        grant.code()
    }
}

impl TryFrom<i16> for PageGrant {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        PageGrant::from_code(code).ok_or_else(|| format!("Invalid page grant code: {}", code))
    }
}

/// Path prefix of pages moved to the trash.
pub const TRASH_PATH_PREFIX: &str = "/trash";

/// A wiki page as returned by a page directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: Uuid,
    pub path: String,
    pub creator_id: Uuid,
    pub grant: PageGrant,
    pub last_update_user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn is_trashed(&self) -> bool {
        self.path == TRASH_PATH_PREFIX || self.path.starts_with("/trash/")
    }

    /// Whether `viewer` may see this page in another user's page list.
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        match self.grant {
            PageGrant::Public => true,
            PageGrant::Owner => viewer == Some(self.creator_id),
            _ => false,
        }
    }
}

/// Serialized form of a page, with the last editor as a plain user object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: Uuid,
    pub path: String,
    pub creator: Uuid,
    pub grant: PageGrant,
    pub last_update_user: Option<PublicUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Page> for PageSummary {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            path: page.path,
            creator: page.creator_id,
            grant: page.grant,
            last_update_user: page.last_update_user.map(PublicUser::from),
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

/// Offset and size of a page-list slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub offset: u64,
    pub limit: u32,
}

impl PageRange {
    /// Range for the 1-based `page` of size `limit`.
    pub fn for_page(page: u32, limit: u32) -> Self {
        Self {
            offset: shared::pagination::page_offset(page, limit),
            limit,
        }
    }
}
