//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request to create a post.
///
/// `status` is `"draft"` (default) or `"published"`; together with a future
/// `publish_at` the post is scheduled instead of published right away.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub media: Option<String>,
    pub status: Option<String>,
    pub publish_at: Option<DateTime<Utc>>,
}

/// Partial content update. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub media: Option<String>,
}

/// Partial update that may also change the publication state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDraftRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub media: Option<String>,
    pub status: Option<String>,
    pub publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
}

/// Create or rename a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// `GET /api/posts/search?tag=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagSearchQuery {
    pub tag: Option<String>,
}

/// `GET /api/posts?category=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub category: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub likes: u64,
    pub liked_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub media: Option<String>,
    pub status: String,
    pub published: bool,
    pub publish_at: Option<DateTime<Utc>>,
    pub likes: u64,
    pub liked_by: Vec<Uuid>,
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_request_defaults() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(req.tags.is_empty());
        assert!(req.status.is_none());
        assert!(req.publish_at.is_none());
    }

    #[test]
    fn test_publish_at_parses_rfc3339() {
        let req: UpdateDraftRequest = serde_json::from_str(
            r#"{"status":"published","publish_at":"2030-01-01T09:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            req.publish_at.map(|at| at.to_rfc3339()),
            Some("2030-01-01T09:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_malformed_publish_at_rejected() {
        let result =
            serde_json::from_str::<UpdateDraftRequest>(r#"{"publish_at":"next tuesday"}"#);
        assert!(result.is_err());
    }
}
