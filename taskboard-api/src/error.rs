/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Every response body carries a stable `error` code string, so clients can
/// branch on the failure kind instead of parsing messages.
///
/// # Example
///
/// ```
/// use taskboard_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// # async fn fetch_data() -> Result<String, ApiError> { Ok("data".to_string()) }
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     // Business logic that can fail
///     let data = fetch_data().await?;
///     Ok(Json(json!({ "data": data })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskboard_shared::auth::authorization::AuthzError;
use taskboard_shared::auth::jwt::JwtError;
use taskboard_shared::auth::middleware::AuthError;
use taskboard_shared::auth::password::PasswordError;
use taskboard_shared::task_id::TaskIdError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401) - missing or invalid credentials
    Unauthorized(String),

    /// Invalid credential (401) - wrong password at sign-in
    InvalidCredential(String),

    /// Forbidden (403) - role does not permit the operation
    Forbidden(String),

    /// Approval pending (403) - admin awaiting super-admin approval
    ApprovalPending(String),

    /// Not found (404)
    NotFound(String),

    /// Already exists (409) - e.g., duplicate email
    AlreadyExists(String),

    /// Has assigned tasks (409) - deletion blocked by task references
    HasAssignedTasks(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// ID generation exhausted (503) - task-id allocation kept colliding
    IdGenerationExhausted(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "already_exists")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::InvalidCredential(msg) => write!(f, "Invalid credential: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::ApprovalPending(msg) => write!(f, "Approval pending: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
            ApiError::HasAssignedTasks(msg) => write!(f, "Has assigned tasks: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::IdGenerationExhausted(msg) => {
                write!(f, "ID generation exhausted: {}", msg)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                msg,
                None,
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                msg,
                None,
            ),
            ApiError::InvalidCredential(msg) => (
                StatusCode::UNAUTHORIZED,
                "invalid_credential",
                msg,
                None,
            ),
            ApiError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                msg,
                None,
            ),
            ApiError::ApprovalPending(msg) => (
                StatusCode::FORBIDDEN,
                "approval_pending",
                msg,
                None,
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "not_found",
                msg,
                None,
            ),
            ApiError::AlreadyExists(msg) => (
                StatusCode::CONFLICT,
                "already_exists",
                msg,
                None,
            ),
            ApiError::HasAssignedTasks(msg) => (
                StatusCode::CONFLICT,
                "has_assigned_tasks",
                msg,
                None,
            ),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::IdGenerationExhausted(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "id_generation_exhausted",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                ApiError::NotFound("Resource not found".to_string())
            }
            sqlx::Error::Database(db_err) => {
                // Only unique violations mean "already exists"
                if db_err.is_unique_violation() {
                    if db_err.constraint().is_some_and(|c| c.contains("email")) {
                        return ApiError::AlreadyExists("Email already exists".to_string());
                    }
                    return ApiError::AlreadyExists("Resource already exists".to_string());
                }

                // A foreign key violation means the request named a row
                // that does not exist (e.g. assigning a task to a missing
                // user)
                if db_err.is_foreign_key_violation() {
                    return ApiError::BadRequest(
                        "Referenced resource does not exist".to_string(),
                    );
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::ActorNotFound => {
                ApiError::Unauthorized("Acting user no longer exists".to_string())
            }
            AuthzError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthzError::ApprovalPending => ApiError::ApprovalPending(
                "Admin account is awaiting super-admin approval".to_string(),
            ),
            AuthzError::InvalidTarget(msg) => ApiError::Forbidden(msg),
            AuthzError::Database(err) => err.into(),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert task-id allocation errors to API errors
impl From<TaskIdError> for ApiError {
    fn from(err: TaskIdError) -> Self {
        match err {
            TaskIdError::Exhausted(attempts) => ApiError::IdGenerationExhausted(format!(
                "Could not allocate a unique task ID after {} attempts",
                attempts
            )),
            TaskIdError::Database(err) => err.into(),
        }
    }
}

/// Convert validator errors into a 422 with per-field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");

        let err = ApiError::HasAssignedTasks("User has assigned tasks".to_string());
        assert_eq!(err.to_string(), "Has assigned tasks: User has assigned tasks");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_task_id_exhaustion_maps_to_503() {
        let err: ApiError = TaskIdError::Exhausted(10).into();
        assert!(matches!(err, ApiError::IdGenerationExhausted(_)));
    }

    #[test]
    fn test_authz_errors_map_to_kinds() {
        let err: ApiError = AuthzError::ApprovalPending.into();
        assert!(matches!(err, ApiError::ApprovalPending(_)));

        let err: ApiError = AuthzError::Forbidden("nope".to_string()).into();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err: ApiError = AuthzError::ActorNotFound.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
