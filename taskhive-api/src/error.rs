/// Error handling for the API server
///
/// A single `ApiError` maps every failure to one of the five outcome kinds
/// the API reports (BadRequest, Unauthorized, Forbidden, NotFound,
/// Internal) and converts to an HTTP response with a JSON body of the form
/// `{"error": "...", "message": "..."}`. Handlers return
/// `Result<T, ApiError>`; store errors are converted at the call site and
/// never escape raw.
///
/// # Example
///
/// ```
/// use taskhive_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler() -> ApiResult<Json<Value>> {
///     Err(ApiError::NotFound("No project found with that ID".to_string()))
/// }
/// ```
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use taskhive_shared::auth::jwt::JwtError;
use taskhive_shared::auth::password::PasswordError;
use taskhive_shared::authz::AuthzError;
use taskhive_shared::keys::KeyError;
use taskhive_shared::membership::MembershipError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): validation failure, duplicate invite/membership
    BadRequest(String),

    /// Unauthorized (401): bad credentials or token
    Unauthorized(String),

    /// Forbidden (403): non-member access, non-leader mutation
    Forbidden(String),

    /// Not found (404): missing user/project/invitation/task by id
    NotFound(String),

    /// Internal server error (500): store write failure
    ///
    /// The message is logged; clients receive a generic body.
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code, e.g. "bad_request"
    pub error: String,

    /// Human-readable message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => {
                // Log the detail, return a generic body.
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Something went wrong".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Runs request validation, reporting the first failing message
///
/// Mirrors the schema-validator contract: `ok | first-error-message`.
pub fn validate_request<T: Validate>(request: &T) -> ApiResult<()> {
    request.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .next()
            .unwrap_or_else(|| "Request validation failed".to_string());
        ApiError::BadRequest(message)
    })
}

/// Convert store errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert authorization failures to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert membership-workflow failures to API errors
impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::AlreadyMember
            | MembershipError::AlreadyInvited
            | MembershipError::NotAMember
            | MembershipError::LastMember => ApiError::BadRequest(err.to_string()),
            MembershipError::InvitationGone => {
                ApiError::NotFound("No invitation found with that ID".to_string())
            }
            MembershipError::Store(e) => e.into(),
        }
    }
}

/// Convert JWT failures to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => ApiError::Internal(format!("Token creation failed: {}", msg)),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

/// Convert password-hashing failures to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert key-sequence failures to API errors
///
/// Keys are server-assigned, so a malformed key means corrupt stored data,
/// not bad input.
impl From<KeyError> for ApiError {
    fn from(err: KeyError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
