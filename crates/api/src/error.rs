use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Message used when a validator gives no message of its own.
pub const DEFAULT_VALIDATION_MESSAGE: &str = "Invalid value";

/// Error code of every request-validation failure.
pub const VALIDATION_FAILED_CODE: &str = "validation_failed";

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// A field error carrying [`DEFAULT_VALIDATION_MESSAGE`].
    pub fn invalid(field: impl Into<String>) -> Self {
        Self::new(field, DEFAULT_VALIDATION_MESSAGE)
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request input rejected before any directory call.
    #[error("Validation failed: {}", describe(.0))]
    Validation(Vec<FieldError>),

    /// A handler-level failure with a fixed code for its endpoint.
    #[error("{message}")]
    Operation {
        status: StatusCode,
        code: Option<&'static str>,
        message: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited")]
    RateLimited { limit: u32, retry_after: u64 },
}

impl ApiError {
    /// 400 without a code.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Operation {
            status: StatusCode::BAD_REQUEST,
            code: None,
            message: message.into(),
        }
    }

    /// 500 with an endpoint-specific code.
    pub fn failure(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Operation {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: Some(code),
            message: message.into(),
        }
    }

    /// Logs `err` and maps it to [`ApiError::failure`].
    pub fn directory_failure(
        code: &'static str,
        message: impl Into<String>,
        err: &dyn std::error::Error,
    ) -> Self {
        tracing::error!(code = code, error = %err, "Directory call failed");
        Self::failure(code, message)
    }

    pub fn field(field: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::invalid(field)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Operation { status, .. } => *status,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationItem {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct OperationBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Validation(fields) => {
                let items: Vec<ValidationItem> = fields
                    .iter()
                    .map(|f| ValidationItem {
                        code: VALIDATION_FAILED_CODE,
                        message: format!("{}: {}", f.field, f.message),
                    })
                    .collect();
                (status, Json(json!({ "errors": items }))).into_response()
            }
            ApiError::Operation { code, message, .. } => {
                let body = OperationBody {
                    code: *code,
                    message,
                };
                (status, Json(json!({ "errors": body }))).into_response()
            }
            ApiError::Unauthorized(message) => {
                let body = OperationBody {
                    code: Some("unauthorized"),
                    message,
                };
                (status, Json(json!({ "errors": body }))).into_response()
            }
            ApiError::Forbidden(message) => {
                let body = OperationBody {
                    code: Some("forbidden"),
                    message,
                };
                (status, Json(json!({ "errors": body }))).into_response()
            }
            ApiError::RateLimited { limit, retry_after } => {
                let message = format!("Rate limit of {} requests/minute exceeded", limit);
                let body = OperationBody {
                    code: Some("rate_limited"),
                    message: &message,
                };
                let mut response = (status, Json(json!({ "errors": body }))).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
        }
    }
}

/// Segments rendered in capitals in wire field names.
const FIELD_ACRONYMS: [&str; 1] = ["xl"];

/// Request name of a derived field: `sort_order` becomes `sortOrder`.
fn wire_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    for (i, part) in field.split('_').enumerate() {
        if i == 0 {
            name.push_str(part);
        } else if FIELD_ACRONYMS.contains(&part) {
            name.push_str(&part.to_ascii_uppercase());
        } else {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                name.extend(first.to_uppercase());
                name.push_str(chars.as_str());
            }
        }
    }
    name
}

/// One entry per field, from the first failed check.
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errors)| {
                let first = errors.first()?;
                Some(FieldError {
                    field: wire_field_name(field),
                    message: first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| DEFAULT_VALIDATION_MESSAGE.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::Validation(fields)
    }
}

/// Successful response body: `{"data": ...}`.
#[derive(Debug, Clone)]
pub struct ApiV3<T>(pub T);

#[derive(Serialize)]
struct DataEnvelope<T> {
    data: T,
}

impl<T: Serialize> IntoResponse for ApiV3<T> {
    fn into_response(self) -> Response {
        Json(DataEnvelope { data: self.0 }).into_response()
    }
}

pub type ApiResult<T> = Result<ApiV3<T>, ApiError>;
