//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use pressroom_core::ports::AuthError;
use pressroom_core::{DomainError, RepoError};
use pressroom_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized(detail),
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                // Detail stays in the logs, never in the body.
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Unauthenticated => AppError::Unauthorized(err.to_string()),
            DomainError::Forbidden { .. } => AppError::Forbidden(err.to_string()),
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::AlreadyReacted | DomainError::NotReacted => {
                AppError::BadRequest(err.to_string())
            }
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Inconsistent(msg) => AppError::Internal(msg),
            DomainError::Store(e) => e.into(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) | RepoError::Conflict(msg) | RepoError::Corrupt(msg) => {
                tracing::error!("Database error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::HashingError(msg) => AppError::Internal(msg),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status(err: DomainError) -> StatusCode {
        AppError::from(err).status_code()
    }

    #[test]
    fn test_domain_error_status_mapping() {
        assert_eq!(status(DomainError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(DomainError::Forbidden {
                allowed: "admin".to_string()
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(DomainError::post_not_found(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(DomainError::AlreadyReacted), StatusCode::BAD_REQUEST);
        assert_eq!(status(DomainError::NotReacted), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DomainError::Duplicate("email".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(DomainError::Store(RepoError::Query("boom".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_detail_names_roles() {
        let err = AppError::from(DomainError::Forbidden {
            allowed: "admin, editor".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Forbidden: Access denied. Allowed roles: admin, editor"
        );
    }
}
