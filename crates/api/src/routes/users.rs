//! User management routes (`/_api/v3/users`).

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{
    build_user_list_query, InvitedUser, NewInvitedUser, PageListTier, PageRange, PageSummary,
    PublicUser, SortOrder, StatusLabel, User, UserListQuery, UserSortField, UserStatus,
};
use domain::services::{
    resolve_page_list_limit, settings::load_site_url, DirectoryError, MAX_RECENT_PAGES_LIMIT,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::pagination::Paginated;
use shared::password::{generate_temporary_password, hash_password};
use shared::validation::{
    parse_positive_int, validate_email_address, validate_not_blank, validate_one_of,
    validate_positive_int, validate_uuid,
};
use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ApiV3};
use crate::extractors::fields::{flag_value, validate_flag};
use crate::extractors::{ApiJson, ApiQuery};
use crate::middleware::metrics::{record_invitations, record_user_action};
use crate::middleware::SessionUser;
use crate::services::invitation_message;

pub const USER_NOT_FOUND: &str = "find-user-is-not-found";
pub const RECENT_LIMIT_MESSAGE: &str = "You should set less than 300 or not to set limit.";

const LIST_FAILED: &str = "user-group-list-fetch-failed";
const RECENT_FAILED: &str = "retrieve-recent-created-pages-failed";
const INVITE_FAILED: &str = "failed-to-create-user-instance";

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::field("id"))
}

/// A validated optional page number; absent means the first page.
fn page_or_first(raw: Option<&str>) -> u32 {
    raw.and_then(|raw| parse_positive_int(raw).ok()).unwrap_or(1)
}

fn choice_or_default<T: FromStr + Default>(raw: Option<&str>) -> T {
    raw.and_then(|raw| raw.parse().ok()).unwrap_or_default()
}

fn validate_status_labels(labels: &[String]) -> Result<(), ValidationError> {
    labels
        .iter()
        .try_for_each(|label| validate_one_of(label, &StatusLabel::NAMES))
}

fn validate_sort_field(sort: &str) -> Result<(), ValidationError> {
    validate_one_of(sort, &UserSortField::NAMES)
}

fn validate_sort_order(sort_order: &str) -> Result<(), ValidationError> {
    validate_one_of(sort_order, &SortOrder::NAMES)
}

/// Query string of `GET /`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListUsersParams {
    #[validate(custom(function = "validate_positive_int"))]
    pub page: Option<String>,
    #[serde(rename = "selectedStatusList[]", alias = "selectedStatusList", default)]
    #[validate(custom(function = "validate_status_labels"))]
    pub selected_status_list: Vec<String>,
    #[serde(rename = "searchText")]
    pub search_text: Option<String>,
    #[validate(custom(function = "validate_sort_field"))]
    pub sort: Option<String>,
    #[serde(rename = "sortOrder")]
    #[validate(custom(function = "validate_sort_order"))]
    pub sort_order: Option<String>,
}

impl TryFrom<ListUsersParams> for UserListQuery {
    type Error = ApiError;

    fn try_from(params: ListUsersParams) -> Result<Self, Self::Error> {
        params.validate()?;

        let status_labels = if params.selected_status_list.is_empty() {
            vec![StatusLabel::All]
        } else {
            params
                .selected_status_list
                .iter()
                .filter_map(|label| label.parse().ok())
                .collect()
        };

        Ok(UserListQuery {
            status_labels,
            search_text: params.search_text.unwrap_or_default(),
            sort: choice_or_default(params.sort.as_deref()),
            sort_order: choice_or_default(params.sort_order.as_deref()),
            page: page_or_first(params.page.as_deref()),
        })
    }
}

/// Search users.
///
/// GET /_api/v3/users
///
/// Requires an administrator session.
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListUsersParams>,
) -> ApiResult<Paginated<PublicUser>> {
    let query = UserListQuery::try_from(params)?;
    let (filter, options) = build_user_list_query(&query);

    let result = state.users.paginate(&filter, &options).await.map_err(|e| {
        ApiError::directory_failure(LIST_FAILED, "Error occurred in fetching user group list", &e)
    })?;

    Ok(ApiV3(result.map(PublicUser::from)))
}

/// Query string of `GET /:id/recent`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RecentPagesParams {
    #[validate(custom(function = "validate_positive_int"))]
    pub page: Option<String>,
    #[validate(custom(function = "validate_recent_limit"))]
    pub limit: Option<String>,
}

/// A validated recent-pages request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentPagesQuery {
    pub user_id: Uuid,
    pub page: u32,
    /// `None` defers to the configured page-list limit.
    pub limit: Option<u32>,
}

/// Any limit that is not an integer in `1..=300` gets the same message.
fn validate_recent_limit(raw: &str) -> Result<(), ValidationError> {
    match parse_positive_int(raw) {
        Ok(limit) if limit <= MAX_RECENT_PAGES_LIMIT => Ok(()),
        _ => {
            let mut error = ValidationError::new("max");
            error.message = Some(Cow::Borrowed(RECENT_LIMIT_MESSAGE));
            Err(error)
        }
    }
}

impl RecentPagesQuery {
    pub fn parse(id: &str, params: RecentPagesParams) -> Result<Self, ApiError> {
        let mut errors = params.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Err(error) = validate_uuid(id) {
            errors.add("id", error);
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(Self {
            user_id: parse_user_id(id)?,
            page: page_or_first(params.page.as_deref()),
            limit: params
                .limit
                .as_deref()
                .and_then(|limit| parse_positive_int(limit).ok()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RecentPagesResponse {
    pub pages: Vec<PageSummary>,
}

/// Pages recently created by a user, as visible to the caller.
///
/// GET /_api/v3/users/:id/recent
///
/// Requires a logged-in session.
pub async fn recent_created_pages(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<RecentPagesParams>,
) -> ApiResult<RecentPagesResponse> {
    let query = RecentPagesQuery::parse(&id, params)?;

    let user = state
        .users
        .find_by_id(query.user_id)
        .await
        .map_err(|e| ApiError::directory_failure(RECENT_FAILED, "Error occurred in find user", &e))?
        .ok_or_else(|| ApiError::bad_request(USER_NOT_FOUND))?;

    let listing_failed = |e: DirectoryError| {
        ApiError::directory_failure(
            RECENT_FAILED,
            "Error occurred in retrieve recent created pages for user",
            &e,
        )
    };

    let limit = resolve_page_list_limit(query.limit, PageListTier::M, state.settings.as_ref())
        .await
        .map_err(listing_failed)?;

    let pages = state
        .pages
        .find_list_by_creator(&user, Some(session.user_id), PageRange::for_page(query.page, limit))
        .await
        .map_err(listing_failed)?;

    Ok(ApiV3(RecentPagesResponse {
        pages: pages.into_iter().map(PageSummary::from).collect(),
    }))
}

/// Query string of `GET /exists`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ExistsParams {
    #[validate(required, length(min = 1), custom(function = "validate_not_blank"))]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Whether a username is taken.
///
/// GET /_api/v3/users/exists
pub async fn exists(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ExistsParams>,
) -> ApiResult<ExistsResponse> {
    params.validate()?;
    let username = params
        .username
        .ok_or_else(|| ApiError::field("username"))?;

    match state.users.find_by_username(&username).await {
        Ok(user) => Ok(ApiV3(ExistsResponse {
            exists: user.is_some(),
        })),
        Err(e) => {
            warn!(error = %e, "Username lookup failed");
            Err(ApiError::bad_request(e.to_string()))
        }
    }
}

fn validate_email_list(emails: &[String]) -> Result<(), ValidationError> {
    emails
        .iter()
        .try_for_each(|email| validate_email_address(email.trim()))
}

/// Body of `POST /invite`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteParams {
    #[validate(required, length(min = 1), custom(function = "validate_email_list"))]
    pub shaped_email_list: Option<Vec<String>>,
    #[validate(required, custom(function = "validate_flag"))]
    pub send_email: Option<Value>,
}

/// A validated invitation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRequest {
    /// Distinct addresses in request order.
    pub emails: Vec<String>,
    pub send_email: bool,
}

impl TryFrom<InviteParams> for InviteRequest {
    type Error = ApiError;

    fn try_from(params: InviteParams) -> Result<Self, Self::Error> {
        params.validate()?;

        let mut emails: Vec<String> = Vec::new();
        for email in params.shaped_email_list.unwrap_or_default() {
            let email = email.trim().to_string();
            if !emails.contains(&email) {
                emails.push(email);
            }
        }

        Ok(Self {
            emails,
            send_email: params
                .send_email
                .as_ref()
                .and_then(flag_value)
                .unwrap_or_default(),
        })
    }
}

/// Create invited accounts with temporary passwords.
///
/// POST /_api/v3/users/invite
///
/// Requires an administrator session. Responds with the bare list of
/// created accounts and their passwords.
pub async fn invite(
    State(state): State<AppState>,
    session: SessionUser,
    ApiJson(params): ApiJson<InviteParams>,
) -> Result<Json<Vec<InvitedUser>>, ApiError> {
    let request = InviteRequest::try_from(params)?;

    let mut passwords = HashMap::with_capacity(request.emails.len());
    let mut new_users = Vec::with_capacity(request.emails.len());
    for email in &request.emails {
        let password = generate_temporary_password();
        let password_hash = hash_password(&password).map_err(|e| {
            ApiError::directory_failure(INVITE_FAILED, "Failed to create user instance", &e)
        })?;
        passwords.insert(email.clone(), password);
        new_users.push(NewInvitedUser {
            email: email.clone(),
            password_hash,
        });
    }

    let created = state
        .users
        .create_invited_users(&new_users)
        .await
        .map_err(|e| ApiError::directory_failure(INVITE_FAILED, "Failed to create user instance", &e))?;

    let invited: Vec<InvitedUser> = created
        .into_iter()
        .filter_map(|user| {
            let password = passwords.remove(&user.email)?;
            Some(InvitedUser {
                email: user.email.clone(),
                password,
                user: PublicUser::from(user),
            })
        })
        .collect();

    record_invitations(invited.len());
    info!(
        admin_id = %session.user_id,
        requested = request.emails.len(),
        created = invited.len(),
        "Users invited"
    );

    if request.send_email {
        send_invitations(&state, &invited).await;
    }

    Ok(Json(invited))
}

async fn send_invitations(state: &AppState, invited: &[InvitedUser]) {
    let site_url = match load_site_url(state.settings.as_ref()).await {
        Ok(url) => url.or_else(|| state.config.env_site_url()),
        Err(e) => {
            warn!(error = %e, "Could not read site URL for invitation mail");
            state.config.env_site_url()
        }
    };

    for entry in invited {
        let message = invitation_message(
            &state.config.mail.sender_name,
            &entry.email,
            &entry.password,
            site_url.as_deref(),
        );
        if let Err(e) = state.mailer.send(message).await {
            warn!(email = %entry.email, error = %e, "Invitation mail failed");
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub user_data: PublicUser,
}

fn updated_user(
    result: Result<Option<User>, DirectoryError>,
    code: &'static str,
    message: &'static str,
    action: &'static str,
) -> ApiResult<UserDataResponse> {
    let user = result
        .map_err(|e| ApiError::directory_failure(code, message, &e))?
        .ok_or_else(|| ApiError::bad_request(USER_NOT_FOUND))?;

    record_user_action(action);
    info!(user_id = %user.id, action, "User updated");
    Ok(ApiV3(UserDataResponse {
        user_data: PublicUser::from(user),
    }))
}

/// PUT /_api/v3/users/:id/giveAdmin
pub async fn give_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserDataResponse> {
    let user_id = parse_user_id(&id)?;
    updated_user(
        state.users.set_admin(user_id, true).await,
        "give-admin-failed",
        "Error occurred in giving admin",
        "give_admin",
    )
}

/// PUT /_api/v3/users/:id/removeAdmin
pub async fn remove_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserDataResponse> {
    let user_id = parse_user_id(&id)?;
    updated_user(
        state.users.set_admin(user_id, false).await,
        "remove-admin-failed",
        "Error occurred in removing admin",
        "remove_admin",
    )
}

/// PUT /_api/v3/users/:id/activate
pub async fn activate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserDataResponse> {
    let user_id = parse_user_id(&id)?;
    updated_user(
        state.users.set_status(user_id, UserStatus::Active).await,
        "activate-user-failed",
        "Error occurred in activating user",
        "activate",
    )
}

/// PUT /_api/v3/users/:id/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserDataResponse> {
    let user_id = parse_user_id(&id)?;
    updated_user(
        state.users.set_status(user_id, UserStatus::Suspended).await,
        "deactivate-user-failed",
        "Error occurred in deactivating user",
        "deactivate",
    )
}

/// Marks the account deleted. The row is kept.
///
/// DELETE /_api/v3/users/:id/remove
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserDataResponse> {
    let user_id = parse_user_id(&id)?;
    updated_user(
        state.users.set_status(user_id, UserStatus::Deleted).await,
        "remove-user-failed",
        "Error occurred in removing user",
        "remove",
    )
}

/// Body of `PUT /reset-password`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordParams {
    #[validate(required, custom(function = "validate_uuid"))]
    pub id: Option<String>,
    #[validate(required, length(min = 6))]
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub user: PublicUser,
}

/// Set a new password chosen by an administrator.
///
/// PUT /_api/v3/users/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<ResetPasswordParams>,
) -> ApiResult<ResetPasswordResponse> {
    params.validate()?;
    let user_id = parse_user_id(params.id.as_deref().unwrap_or_default())?;
    let new_password = params
        .new_password
        .ok_or_else(|| ApiError::field("newPassword"))?;

    const CODE: &str = "reset-password-failed";
    const MESSAGE: &str = "Error occurred in resetting password";

    let password_hash =
        hash_password(&new_password).map_err(|e| ApiError::directory_failure(CODE, MESSAGE, &e))?;

    let user = state
        .users
        .set_password(user_id, &password_hash)
        .await
        .map_err(|e| ApiError::directory_failure(CODE, MESSAGE, &e))?
        .ok_or_else(|| ApiError::bad_request(USER_NOT_FOUND))?;

    record_user_action("reset_password");
    info!(user_id = %user.id, "Password reset by administrator");
    Ok(ApiV3(ResetPasswordResponse {
        user: PublicUser::from(user),
    }))
}
