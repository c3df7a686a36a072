use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Post, PostFilter, User};
use crate::error::{DomainError, RepoError};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// List every entity.
    async fn find_all(&self) -> Result<Vec<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` when absent.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// In-place mutation applied inside a post's critical section.
///
/// May be invoked more than once when the store retries on a concurrent
/// write; an `Err` aborts the update and leaves the stored post untouched.
pub type PostMutation<'a> = dyn FnMut(&mut Post) -> Result<(), DomainError> + Send + 'a;

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Posts matching `filter`, in no particular order.
    async fn find_matching(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError>;

    /// Atomically read, mutate and save one post.
    ///
    /// Concurrent calls for the same id are serialized; no update is lost.
    /// Fails with `DomainError::NotFound` when the post does not exist.
    async fn update_with(
        &self,
        id: Uuid,
        mutation: &mut PostMutation<'_>,
    ) -> Result<Post, DomainError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    /// Replace a stored category. `RepoError::NotFound` when absent.
    async fn update(&self, category: Category) -> Result<Category, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}
