//! User list query building.
//!
//! Turns a validated list request into a filter plus paging options that a
//! [`UserDirectory`](crate::services::UserDirectory) can execute.

use serde::{Deserialize, Serialize};
use shared::pagination::page_offset;
use std::fmt;
use std::str::FromStr;

use super::user::{expand_status_labels, StatusLabel, User, UserStatus, USER_PUBLIC_FIELDS};

/// Fixed number of users per page in the admin list.
pub const USER_LIST_PAGE_SIZE: u32 = 50;

/// Sort field for the user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserSortField {
    #[default]
    Id,
}

impl UserSortField {
    pub const NAMES: [&'static str; 1] = ["id"];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserSortField::Id => "id",
        }
    }

    pub fn as_sql_column(&self) -> &'static str {
        match self {
            UserSortField::Id => "id",
        }
    }
}

impl FromStr for UserSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(UserSortField::Id),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

/// Sort order for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const NAMES: [&'static str; 2] = ["asc", "desc"];

    /// `1` for ascending, `-1` for descending.
    pub fn direction(&self) -> i8 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Free-text search over name, username and email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern {
    /// Matches every record, including ones with empty or missing fields.
    Anything,
    /// Literal, case-sensitive substring.
    Substring(String),
}

impl SearchPattern {
    pub fn from_search_text(text: &str) -> Self {
        if text.is_empty() {
            SearchPattern::Anything
        } else {
            SearchPattern::Substring(text.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            SearchPattern::Anything => true,
            SearchPattern::Substring(needle) => value.contains(needle.as_str()),
        }
    }

    pub fn as_substring(&self) -> Option<&str> {
        match self {
            SearchPattern::Anything => None,
            SearchPattern::Substring(needle) => Some(needle),
        }
    }
}

impl fmt::Display for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPattern::Anything => write!(f, "*"),
            SearchPattern::Substring(needle) => write!(f, "{:?}", needle),
        }
    }
}

/// A validated user list request.
#[derive(Debug, Clone, PartialEq)]
pub struct UserListQuery {
    pub status_labels: Vec<StatusLabel>,
    pub search_text: String,
    pub sort: UserSortField,
    pub sort_order: SortOrder,
    pub page: u32,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            status_labels: vec![StatusLabel::All],
            search_text: String::new(),
            sort: UserSortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
        }
    }
}

/// Which users to return: status in `statuses` AND search matching any of
/// name, username or email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListFilter {
    pub statuses: Vec<UserStatus>,
    pub search: SearchPattern,
}

impl UserListFilter {
    pub fn matches(&self, user: &User) -> bool {
        if !self.statuses.contains(&user.status) {
            return false;
        }

        match &self.search {
            SearchPattern::Anything => true,
            search => {
                search.matches(&user.name)
                    || user.username.as_deref().is_some_and(|u| search.matches(u))
                    || search.matches(&user.email)
            }
        }
    }
}

/// How to order and slice the matching users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListOptions {
    pub sort: UserSortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
    pub select: &'static [&'static str],
}

impl UserListOptions {
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }
}

/// Builds the filter and options for a paginated user search.
pub fn build_user_list_query(query: &UserListQuery) -> (UserListFilter, UserListOptions) {
    let filter = UserListFilter {
        statuses: expand_status_labels(&query.status_labels),
        search: SearchPattern::from_search_text(&query.search_text),
    };

    let options = UserListOptions {
        sort: query.sort,
        sort_order: query.sort_order,
        page: query.page.max(1),
        limit: USER_LIST_PAGE_SIZE,
        select: &USER_PUBLIC_FIELDS,
    };

    (filter, options)
}
