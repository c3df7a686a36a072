use std::sync::Arc;

use uuid::Uuid;

use crate::access::{self, Actor, Operation};
use crate::domain::{DraftChanges, NewPost, Post, PostChanges, PostFilter, PublicationState};
use crate::error::{DomainError, RepoError};
use crate::ports::{CategoryRepository, Clock, PostRepository, PublicationScheduler};

/// Post lifecycle, comments and reactions.
///
/// Every mutation of an existing post runs inside
/// [`PostRepository::update_with`], the per-post critical section shared with
/// the publication scheduler.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    scheduler: Arc<dyn PublicationScheduler>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        scheduler: Arc<dyn PublicationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            categories,
            scheduler,
            clock,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        category_id: Uuid,
        input: NewPost,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::CreatePost)?;

        if self.categories.find_by_id(category_id).await?.is_none() {
            return Err(DomainError::category_not_found(category_id));
        }

        let post = Post::new(actor.user_id, category_id, input, self.clock.now())?;
        let post = self.posts.insert(post).await?;

        if let Some(at) = post.state().pending_at() {
            self.scheduler.schedule(post.id, at).await?;
        }

        tracing::info!(
            post_id = %post.id,
            author_id = %actor.user_id,
            status = %post.status,
            publish_at = ?post.publish_at,
            "Post created"
        );
        Ok(self.settled(post))
    }

    pub async fn update_draft(
        &self,
        actor: &Actor,
        post_id: Uuid,
        changes: DraftChanges,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::UpdateDraft)?;

        let now = self.clock.now();
        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| {
                post.apply_draft_changes(changes.clone(), now).map(|_| ())
            })
            .await?;

        match post.state() {
            PublicationState::PendingPublish(at) => self.scheduler.schedule(post_id, at).await?,
            _ => self.scheduler.cancel(post_id).await,
        }

        tracing::info!(post_id = %post_id, state = ?post.state(), "Draft updated");
        Ok(self.settled(post))
    }

    pub async fn publish_now(&self, actor: &Actor, post_id: Uuid) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::PublishPost)?;

        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| {
                post.publish_now();
                Ok(())
            })
            .await?;
        self.scheduler.cancel(post_id).await;

        tracing::info!(post_id = %post_id, "Post published");
        Ok(post)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::UpdatePost)?;

        let now = self.clock.now();
        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| post.apply_changes(changes.clone(), now))
            .await?;
        Ok(self.settled(post))
    }

    pub async fn delete(&self, actor: &Actor, post_id: Uuid) -> Result<(), DomainError> {
        access::authorize(Some(actor), Operation::DeletePost)?;

        self.scheduler.cancel(post_id).await;
        self.posts.delete(post_id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(post_id),
            other => other.into(),
        })?;

        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, post_id: Uuid) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::ViewPost)?;

        self.posts
            .find_by_id(post_id)
            .await?
            .map(|post| self.settled(post))
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    /// Posts visible to `viewer`, newest first. Staff see drafts and pending
    /// posts; everyone else sees published posts only.
    pub async fn list(
        &self,
        viewer: Option<&Actor>,
        filter: PostFilter,
    ) -> Result<Vec<Post>, DomainError> {
        access::authorize(viewer, Operation::ListPosts)?;
        self.visible(viewer, &filter).await
    }

    pub async fn search_by_tag(
        &self,
        viewer: Option<&Actor>,
        tag: Option<&str>,
    ) -> Result<Vec<Post>, DomainError> {
        access::authorize(viewer, Operation::SearchPosts)?;

        let tag = tag
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::InvalidInput("tag query is required".to_string()))?;

        let filter = PostFilter {
            tag: Some(tag.to_string()),
            ..Default::default()
        };
        self.visible(viewer, &filter).await
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        content: String,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::AddComment)?;

        let now = self.clock.now();
        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| {
                post.add_comment(actor.user_id, content.clone(), now).map(|_| ())
            })
            .await?;
        Ok(self.settled(post))
    }

    pub async fn remove_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::RemoveComment)?;

        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| post.remove_comment(comment_id).map(|_| ()))
            .await?;
        Ok(self.settled(post))
    }

    pub async fn like_post(&self, actor: &Actor, post_id: Uuid) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::LikePost)?;

        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| post.reactions.like(actor.user_id))
            .await?;
        tracing::debug!(post_id = %post_id, likes = post.reactions.likes, "Post liked");
        Ok(self.settled(post))
    }

    pub async fn unlike_post(&self, actor: &Actor, post_id: Uuid) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::UnlikePost)?;

        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| post.reactions.unlike(actor.user_id))
            .await?;
        Ok(self.settled(post))
    }

    pub async fn like_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::LikeComment)?;

        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| {
                post.comment_mut(comment_id)?.reactions.like(actor.user_id)
            })
            .await?;
        Ok(self.settled(post))
    }

    pub async fn unlike_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Post, DomainError> {
        access::authorize(Some(actor), Operation::UnlikeComment)?;

        let post = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| {
                post.comment_mut(comment_id)?.reactions.unlike(actor.user_id)
            })
            .await?;
        Ok(self.settled(post))
    }

    async fn visible(
        &self,
        viewer: Option<&Actor>,
        filter: &PostFilter,
    ) -> Result<Vec<Post>, DomainError> {
        let staff = viewer.is_some_and(|a| a.role.is_staff());

        let mut posts: Vec<Post> = self
            .posts
            .find_matching(filter)
            .await?
            .into_iter()
            .map(|post| self.settled(post))
            .filter(|post| staff || post.published)
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Overdue pending posts read as published even before their timer runs.
    fn settled(&self, mut post: Post) -> Post {
        post.settle(self.clock.now());
        post
    }
}
