/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the
/// matching status code with a JSON body.
///
/// Permission denials and last-member removals are not reported as errors:
/// handlers turn them into a 303 redirect back to the unchanged detail view
/// with [`or_redirect`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use bugboard_shared::auth::{jwt::JwtError, password::PasswordError};
use bugboard_shared::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. a taken username
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity (422)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Silent rejection: 303 back to an unchanged page
    #[error("Rejected, redirecting to {0}")]
    Rejected(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),
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
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Rejected(location) => return Redirect::to(&location).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
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
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Maps silent rejections to a redirect to `location`, other errors as usual
pub fn or_redirect<T>(result: CoreResult<T>, location: &str) -> ApiResult<T> {
    result.map_err(|err| {
        if err.is_silent_rejection() {
            ApiError::Rejected(location.to_string())
        } else {
            err.into()
        }
    })
}

/// Convert core errors to API errors
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, message } => {
                ApiError::ValidationError(vec![ValidationErrorDetail { field, message }])
            }
            CoreError::PermissionDenied(reason) => ApiError::Forbidden(reason.to_string()),
            CoreError::LastMember => ApiError::Forbidden(err.to_string()),
            CoreError::Unauthenticated => ApiError::Unauthorized(err.to_string()),
            CoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CoreError::Database(e) => e.into(),
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict("Resource already exists".to_string());
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert request body validation errors to API errors
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
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
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use bugboard_shared::error::{EntityKind, PermissionDenied};

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("issue 3 not found".to_string());
        assert_eq!(err.to_string(), "Not found: issue 3 not found");
    }

    #[test]
    fn test_core_error_status_codes() {
        let status = |err: CoreError| ApiError::from(err).into_response().status();

        assert_eq!(
            status(CoreError::validation("title", "This field is required")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(CoreError::not_found(EntityKind::Project, 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(CoreError::Unauthenticated), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_silent_rejection_redirects() {
        let result: CoreResult<()> = Err(CoreError::PermissionDenied(PermissionDenied::NotCreator));
        let response = or_redirect(result, "/v1/projects/1").unwrap_err().into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/v1/projects/1");

        let result: CoreResult<()> = Err(CoreError::LastMember);
        assert!(matches!(
            or_redirect(result, "/v1/issues/2"),
            Err(ApiError::Rejected(location)) if location == "/v1/issues/2"
        ));

        let result: CoreResult<()> = Err(CoreError::not_found(EntityKind::Issue, 2));
        assert!(matches!(or_redirect(result, "/"), Err(ApiError::NotFound(_))));
    }
}
