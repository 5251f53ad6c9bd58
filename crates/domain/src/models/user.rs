//! User account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a user account, stored as a numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum UserStatus {
    Registered,
    Active,
    Suspended,
    Deleted,
    Invited,
}

impl UserStatus {
    /// Statuses an admin can list. Deleted accounts never show up.
    pub const LISTABLE: [UserStatus; 4] = [
        UserStatus::Registered,
        UserStatus::Active,
        UserStatus::Suspended,
        UserStatus::Invited,
    ];

    pub fn code(self) -> i16 {
        match self {
            UserStatus::Registered => 1,
            UserStatus::Active => 2,
            UserStatus::Suspended => 3,
            UserStatus::Deleted => 4,
            UserStatus::Invited => 5,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(UserStatus::Registered),
            2 => Some(UserStatus::Active),
            3 => Some(UserStatus::Suspended),
            4 => Some(UserStatus::Deleted),
            5 => Some(UserStatus::Invited),
            _ => None,
        }
    }
}

impl From<UserStatus> for i16 {
    fn from(status: UserStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for UserStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        UserStatus::from_code(code).ok_or_else(|| format!("Invalid user status code: {}", code))
    }
}

/// Status names accepted by the user list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLabel {
    Registered,
    Active,
    Suspended,
    Invited,
    /// Admin-screen name for suspended accounts.
    Deactivated,
    All,
}

impl StatusLabel {
    pub const NAMES: [&'static str; 6] = [
        "registered",
        "active",
        "suspended",
        "invited",
        "deactivated",
        "all",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Registered => "registered",
            StatusLabel::Active => "active",
            StatusLabel::Suspended => "suspended",
            StatusLabel::Invited => "invited",
            StatusLabel::Deactivated => "deactivated",
            StatusLabel::All => "all",
        }
    }

    /// The concrete status for a named label; `None` for `all`.
    pub fn status(&self) -> Option<UserStatus> {
        match self {
            StatusLabel::Registered => Some(UserStatus::Registered),
            StatusLabel::Active => Some(UserStatus::Active),
            StatusLabel::Suspended | StatusLabel::Deactivated => Some(UserStatus::Suspended),
            StatusLabel::Invited => Some(UserStatus::Invited),
            StatusLabel::All => None,
        }
    }
}

impl FromStr for StatusLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(StatusLabel::Registered),
            "active" => Ok(StatusLabel::Active),
            "suspended" => Ok(StatusLabel::Suspended),
            "invited" => Ok(StatusLabel::Invited),
            "deactivated" => Ok(StatusLabel::Deactivated),
            "all" => Ok(StatusLabel::All),
            _ => Err(format!("Invalid status label: {}", s)),
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expands requested labels into the set of status codes to match.
///
/// `all` anywhere in the list wins and yields every listable status.
/// The result is sorted and free of duplicates.
pub fn expand_status_labels(labels: &[StatusLabel]) -> Vec<UserStatus> {
    if labels.contains(&StatusLabel::All) {
        return UserStatus::LISTABLE.to_vec();
    }

    labels
        .iter()
        .filter_map(StatusLabel::status)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fields exposed when a user is rendered for other users.
pub const USER_PUBLIC_FIELDS: [&str; 9] = [
    "id",
    "name",
    "username",
    "email",
    "status",
    "admin",
    "imageUrl",
    "createdAt",
    "lastLoginAt",
];

/// A user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Invited users pick a username when they register.
    pub username: Option<String>,
    pub email: String,
    pub status: UserStatus,
    pub admin: bool,
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// The public projection of a user (see [`USER_PUBLIC_FIELDS`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub status: UserStatus,
    pub admin: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            status: user.status,
            admin: user.admin,
            image_url: user.image_url.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            status: user.status,
            admin: user.admin,
            image_url: user.image_url,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Data for an account created by invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitedUser {
    pub email: String,
    pub password_hash: String,
}

/// One row of the invitation response.
#[derive(Debug, Clone, Serialize)]
pub struct InvitedUser {
    pub email: String,
    /// Temporary password, shown once to the inviting admin.
    pub password: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            username: Some("alice".to_string()),
            email: "alice@example.com".to_string(),
            status: UserStatus::Active,
            admin: false,
            password_hash: Some("$argon2id$secret".to_string()),
            image_url: None,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UserStatus::Registered.code(), 1);
        assert_eq!(UserStatus::Active.code(), 2);
        assert_eq!(UserStatus::Suspended.code(), 3);
        assert_eq!(UserStatus::Deleted.code(), 4);
        assert_eq!(UserStatus::Invited.code(), 5);
    }

    #[test]
    fn test_status_from_code() {
        for status in [
            UserStatus::Registered,
            UserStatus::Active,
            UserStatus::Suspended,
            UserStatus::Deleted,
            UserStatus::Invited,
        ] {
            assert_eq!(UserStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(UserStatus::from_code(0), None);
        assert_eq!(UserStatus::from_code(6), None);
    }

    #[test]
    fn test_status_serializes_as_number() {
        assert_eq!(serde_json::to_value(UserStatus::Invited).unwrap(), 5);
        let status: UserStatus = serde_json::from_value(serde_json::json!(2)).unwrap();
        assert_eq!(status, UserStatus::Active);
        assert!(serde_json::from_value::<UserStatus>(serde_json::json!(9)).is_err());
    }

    #[test]
    fn test_status_label_from_str() {
        for name in StatusLabel::NAMES {
            let label: StatusLabel = name.parse().unwrap();
            assert_eq!(label.as_str(), name);
        }
        assert!("Active".parse::<StatusLabel>().is_err());
        assert!("deleted".parse::<StatusLabel>().is_err());
        assert!("".parse::<StatusLabel>().is_err());
    }

    #[test]
    fn test_expand_all() {
        assert_eq!(
            expand_status_labels(&[StatusLabel::All]),
            vec![
                UserStatus::Registered,
                UserStatus::Active,
                UserStatus::Suspended,
                UserStatus::Invited
            ]
        );
    }

    #[test]
    fn test_expand_all_wins_over_named_labels() {
        let codes: Vec<i16> = expand_status_labels(&[StatusLabel::Active, StatusLabel::All])
            .into_iter()
            .map(UserStatus::code)
            .collect();
        assert_eq!(codes, vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_expand_single_label() {
        assert_eq!(
            expand_status_labels(&[StatusLabel::Registered]),
            vec![UserStatus::Registered]
        );
        assert_eq!(
            expand_status_labels(&[StatusLabel::Invited]),
            vec![UserStatus::Invited]
        );
    }

    #[test]
    fn test_expand_deactivated_means_suspended() {
        assert_eq!(
            expand_status_labels(&[StatusLabel::Deactivated, StatusLabel::Suspended]),
            vec![UserStatus::Suspended]
        );
    }

    #[test]
    fn test_expand_is_a_set() {
        assert_eq!(
            expand_status_labels(&[
                StatusLabel::Invited,
                StatusLabel::Registered,
                StatusLabel::Invited
            ]),
            vec![UserStatus::Registered, UserStatus::Invited]
        );
    }

    #[test]
    fn test_expand_empty() {
        assert!(expand_status_labels(&[]).is_empty());
    }

    #[test]
    fn test_public_user_omits_password_hash() {
        let json = serde_json::to_value(PublicUser::from(&sample_user())).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("passwordHash"));
        assert_eq!(object.len(), USER_PUBLIC_FIELDS.len());
        for field in USER_PUBLIC_FIELDS {
            assert!(object.contains_key(field), "missing field {}", field);
        }
    }

    #[test]
    fn test_public_user_json_shape() {
        let json = serde_json::to_value(PublicUser::from(&sample_user())).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["status"], 2);
        assert_eq!(json["admin"], false);
        assert!(json["imageUrl"].is_null());
    }
}
