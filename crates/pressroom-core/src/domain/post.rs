use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::PublicationState;
use super::reactions::Reactions;
use crate::error::DomainError;

/// Stored publication status. "Scheduled" is `Published` plus a future
/// `publish_at`, not a separate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::InvalidInput(format!(
                "status must be 'draft' or 'published', got '{}'",
                other
            ))),
        }
    }
}

/// Comment entity - lives only inside its parent post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(flatten)]
    pub reactions: Reactions,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: Uuid, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            content,
            reactions: Reactions::default(),
            created_at: now,
        }
    }
}

/// Post entity - the primary content with a publication lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub media: Option<String>,
    pub status: PostStatus,
    pub published: bool,
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub reactions: Reactions,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub media: Option<String>,
    pub status: Option<PostStatus>,
    pub publish_at: Option<DateTime<Utc>>,
}

/// Partial content update; lifecycle fields are not touched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub media: Option<String>,
}

/// Partial update that may also move the post through its lifecycle.
#[derive(Debug, Clone, Default)]
pub struct DraftChanges {
    pub content: PostChanges,
    pub status: Option<PostStatus>,
    pub publish_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a new post in the state implied by the requested status.
    pub fn new(
        author_id: Uuid,
        category_id: Uuid,
        input: NewPost,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = required_text("title", input.title)?;
        let content = required_text("content", input.content)?;
        let state = PublicationState::resolve(
            input.status.unwrap_or_default(),
            input.publish_at,
            now,
        );

        let mut post = Self {
            id: Uuid::new_v4(),
            author_id,
            category_id,
            title,
            content,
            tags: input.tags,
            media: input.media,
            status: PostStatus::Draft,
            published: false,
            publish_at: None,
            reactions: Reactions::default(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        post.enter(state);
        Ok(post)
    }

    /// Apply a content update. `updated_at` moves only when the content does.
    pub fn apply_changes(
        &mut self,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(title) = changes.title {
            self.title = required_text("title", title)?;
        }
        if let Some(content) = changes.content {
            let content = required_text("content", content)?;
            if content != self.content {
                self.content = content;
                self.updated_at = now;
            }
        }
        if let Some(tags) = changes.tags {
            self.tags = tags;
        }
        if let Some(media) = changes.media {
            self.media = Some(media);
        }
        Ok(())
    }

    /// Append a comment and return a copy of it.
    pub fn add_comment(
        &mut self,
        author_id: Uuid,
        content: String,
        now: DateTime<Utc>,
    ) -> Result<Comment, DomainError> {
        let content = required_text("comment", content)?;
        let comment = Comment::new(author_id, content, now);
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub fn remove_comment(&mut self, comment_id: Uuid) -> Result<Comment, DomainError> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| DomainError::comment_not_found(comment_id))?;
        Ok(self.comments.remove(index))
    }

    pub fn comment_mut(&mut self, comment_id: Uuid) -> Result<&mut Comment, DomainError> {
        self.comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| DomainError::comment_not_found(comment_id))
    }

    /// Case-insensitive substring match against any tag.
    pub fn has_tag_like(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

fn required_text(field: &str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Query filter understood by every post store.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category_id: Option<Uuid>,
    pub tag: Option<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(category_id) = self.category_id {
            if post.category_id != category_id {
                return false;
            }
        }
        match &self.tag {
            Some(tag) => post.has_tag_like(tag),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(now: DateTime<Utc>) -> Post {
        Post::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewPost {
                title: "  Hello ".to_string(),
                content: "Body".to_string(),
                tags: vec!["Rust".to_string(), "async".to_string()],
                ..Default::default()
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_new_post_trims_and_defaults_to_draft() {
        let post = draft(Utc::now());
        assert_eq!(post.title, "Hello");
        assert_eq!(post.status, PostStatus::Draft);
        assert!(!post.published);
        assert_eq!(post.reactions.likes, 0);
    }

    #[test]
    fn test_empty_title_rejected() {
        let result = Post::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewPost {
                title: "   ".to_string(),
                content: "Body".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn test_updated_at_moves_only_on_content_change() {
        let created = Utc::now();
        let mut post = draft(created);
        let later = created + chrono::Duration::minutes(5);

        post.apply_changes(
            PostChanges {
                title: Some("New title".to_string()),
                tags: Some(vec![]),
                ..Default::default()
            },
            later,
        )
        .unwrap();
        assert_eq!(post.updated_at, created);

        post.apply_changes(
            PostChanges {
                content: Some("New body".to_string()),
                ..Default::default()
            },
            later,
        )
        .unwrap();
        assert_eq!(post.updated_at, later);
    }

    #[test]
    fn test_comments_keep_creation_order() {
        let now = Utc::now();
        let mut post = draft(now);
        let first = post.add_comment(Uuid::new_v4(), "first".to_string(), now).unwrap();
        let second = post.add_comment(Uuid::new_v4(), "second".to_string(), now).unwrap();

        assert_eq!(post.comments[0].id, first.id);
        assert_eq!(post.comments[1].id, second.id);

        post.remove_comment(first.id).unwrap();
        assert_eq!(post.comments.len(), 1);
        assert!(matches!(
            post.remove_comment(first.id),
            Err(DomainError::NotFound { entity_type: "Comment", .. })
        ));
    }

    #[test]
    fn test_tag_filter_is_case_insensitive_substring() {
        let post = draft(Utc::now());
        let filter = PostFilter {
            tag: Some("RUS".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&post));
        assert!(!PostFilter {
            tag: Some("go".to_string()),
            ..Default::default()
        }
        .matches(&post));
        assert!(!PostFilter {
            category_id: Some(Uuid::new_v4()),
            ..Default::default()
        }
        .matches(&post));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Published".parse::<PostStatus>().unwrap(), PostStatus::Published);
        assert!("scheduled".parse::<PostStatus>().is_err());
    }
}
