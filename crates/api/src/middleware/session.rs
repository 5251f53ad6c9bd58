//! Session authentication middleware.
//!
//! Sessions are signed by the wiki's login flow. These guards verify the
//! Bearer token, put a [`SessionUser`] into request extensions and reject
//! callers that are not logged in (401) or not administrators (403).

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use shared::jwt::SessionTokens;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The caller behind a verified session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl SessionUser {
    /// Verifies `token` and reads the caller from its claims.
    pub fn from_token(tokens: &SessionTokens, token: &str) -> Result<Self, ApiError> {
        let claims = tokens.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        Ok(Self {
            user_id,
            is_admin: claims.admin,
        })
    }

    /// Authenticates from an `Authorization: Bearer` header.
    pub fn from_headers(tokens: &SessionTokens, headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;
        Self::from_token(tokens, token)
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Requires any logged-in user.
pub async fn require_login(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = SessionUser::from_headers(&state.tokens, req.headers())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Requires a logged-in administrator.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = SessionUser::from_headers(&state.tokens, req.headers())?;
    if !user.is_admin {
        tracing::info!(user_id = %user.user_id, path = %req.uri().path(), "Admin route refused");
        return Err(ApiError::Forbidden("Administrator access required".to_string()));
    }
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
