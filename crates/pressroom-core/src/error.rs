//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied. Allowed roles: {allowed}")]
    Forbidden { allowed: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already liked")]
    AlreadyReacted,

    #[error("Not liked yet")]
    NotReacted,

    #[error("Internal consistency violation: {0}")]
    Inconsistent(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Store(#[from] RepoError),
}

impl DomainError {
    pub fn post_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }

    pub fn comment_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Comment",
            id,
        }
    }

    pub fn category_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Category",
            id,
        }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "User",
            id,
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Stored record could not be decoded: {0}")]
    Corrupt(String),
}
