//! In-memory stores - used when no `DATABASE_URL` is configured.
//!
//! Each record lives in its own `tokio::sync::Mutex` slot. The slot lock is
//! the per-post critical section behind [`PostRepository::update_with`].
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use pressroom_core::domain::{Category, Post, PostFilter, User};
use pressroom_core::error::{DomainError, RepoError};
use pressroom_core::ports::{
    BaseRepository, CategoryRepository, PostMutation, PostRepository, UserRepository,
};

trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Post {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Category {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for User {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// `None` marks a record deleted while someone was waiting on its lock.
type Slot<T> = Arc<Mutex<Option<T>>>;

struct Table<T> {
    rows: RwLock<HashMap<Uuid, Slot<T>>>,
}

impl<T: Keyed + Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, id: Uuid) -> Option<Slot<T>> {
        self.rows.read().await.get(&id).cloned()
    }

    async fn get(&self, id: Uuid) -> Option<T> {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        guard.clone()
    }

    async fn all(&self) -> Vec<T> {
        let slots: Vec<Slot<T>> = self.rows.read().await.values().cloned().collect();

        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(row) = slot.lock().await.clone() {
                out.push(row);
            }
        }
        out
    }

    async fn insert(&self, row: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&row.key()) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        rows.insert(row.key(), Arc::new(Mutex::new(Some(row.clone()))));
        Ok(row)
    }

    async fn remove(&self, id: Uuid) -> Result<(), RepoError> {
        let slot = self
            .rows
            .write()
            .await
            .remove(&id)
            .ok_or(RepoError::NotFound)?;
        slot.lock().await.take();
        Ok(())
    }

    async fn replace(&self, row: T) -> Result<T, RepoError> {
        let slot = self.slot(row.key()).await.ok_or(RepoError::NotFound)?;
        let mut guard = slot.lock().await;
        match guard.as_mut() {
            Some(current) => {
                *current = row.clone();
                Ok(row)
            }
            None => Err(RepoError::NotFound),
        }
    }
}

/// In-memory post store.
pub struct InMemoryPostRepository {
    table: Table<Post>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.table.get(id).await)
    }

    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.table.all().await)
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        self.table.insert(entity).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.table.remove(id).await
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_matching(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.table.all().await;
        posts.retain(|post| filter.matches(post));
        Ok(posts)
    }

    async fn update_with(
        &self,
        id: Uuid,
        mutation: &mut PostMutation<'_>,
    ) -> Result<Post, DomainError> {
        let slot = self
            .table
            .slot(id)
            .await
            .ok_or_else(|| DomainError::post_not_found(id))?;
        let mut guard = slot.lock().await;

        let current = guard
            .as_ref()
            .ok_or_else(|| DomainError::post_not_found(id))?;
        let mut next = current.clone();
        mutation(&mut next)?;

        *guard = Some(next.clone());
        Ok(next)
    }
}

/// In-memory category store.
pub struct InMemoryCategoryRepository {
    table: Table<Category>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryCategoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.table.get(id).await)
    }

    async fn find_all(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.table.all().await)
    }

    async fn insert(&self, entity: Category) -> Result<Category, RepoError> {
        self.table.insert(entity).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.table.remove(id).await
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        self.table.replace(category).await
    }
}

/// In-memory user store. Emails are unique.
pub struct InMemoryUserRepository {
    table: Table<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.table.get(id).await)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.table.all().await)
    }

    async fn insert(&self, entity: User) -> Result<User, RepoError> {
        // The map write lock is held across the uniqueness check.
        let mut rows = self.table.rows.write().await;
        if rows.contains_key(&entity.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        for slot in rows.values() {
            if let Some(existing) = slot.lock().await.as_ref() {
                if existing.email == entity.email {
                    return Err(RepoError::Constraint("Email already registered".to_string()));
                }
            }
        }
        rows.insert(entity.id, Arc::new(Mutex::new(Some(entity.clone()))));
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.table.remove(id).await
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .table
            .all()
            .await
            .into_iter()
            .find(|user| user.email == email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pressroom_core::Role;
    use pressroom_core::domain::NewPost;

    fn post(tags: &[&str]) -> Post {
        Post::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewPost {
                title: "Title".to_string(),
                content: "Content".to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post(&[])).await.unwrap();

        let found = repo.find_by_id(stored.id).await.unwrap();
        assert_eq!(found, Some(stored));
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post(&[])).await.unwrap();

        let result = repo.insert(stored).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_post_untouched() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post(&[])).await.unwrap();

        let result = repo
            .update_with(stored.id, &mut |p: &mut Post| {
                p.title = "changed".to_string();
                Err(DomainError::AlreadyReacted)
            })
            .await;

        assert!(matches!(result, Err(DomainError::AlreadyReacted)));
        assert_eq!(repo.find_by_id(stored.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let repo = InMemoryPostRepository::new();
        let id = Uuid::new_v4();

        let result = repo.update_with(id, &mut |_: &mut Post| Ok(())).await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity_type: "Post", .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_then_update_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post(&[])).await.unwrap();

        repo.delete(stored.id).await.unwrap();
        assert!(matches!(repo.delete(stored.id).await, Err(RepoError::NotFound)));

        let result = repo.update_with(stored.id, &mut |_: &mut Post| Ok(())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_matching_by_tag() {
        let repo = InMemoryPostRepository::new();
        repo.insert(post(&["Rust", "tokio"])).await.unwrap();
        repo.insert(post(&["python"])).await.unwrap();

        let filter = PostFilter {
            tag: Some("rust".to_string()),
            ..Default::default()
        };
        let found = repo.find_matching(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tags[0], "Rust");
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let stored = repo.insert(post(&[])).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.update_with(stored.id, &mut |p: &mut Post| {
                    p.tags.push("x".to_string());
                    Ok(())
                })
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let post = repo.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(post.tags.len(), 32);
    }

    #[tokio::test]
    async fn test_category_update_missing() {
        let repo = InMemoryCategoryRepository::new();
        let category = Category::new("News".to_string(), Utc::now()).unwrap();

        assert!(matches!(
            repo.update(category.clone()).await,
            Err(RepoError::NotFound)
        ));

        repo.insert(category.clone()).await.unwrap();
        let mut renamed = category.clone();
        renamed.name = "World".to_string();
        assert_eq!(repo.update(renamed).await.unwrap().name, "World");
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let repo = InMemoryUserRepository::new();
        let first = User::new(
            "ann".to_string(),
            "ann@example.com".to_string(),
            "hash".to_string(),
            Role::User,
        );
        let second = User::new(
            "ann2".to_string(),
            "ann@example.com".to_string(),
            "hash".to_string(),
            Role::User,
        );

        repo.insert(first.clone()).await.unwrap();
        assert!(matches!(
            repo.insert(second).await,
            Err(RepoError::Constraint(_))
        ));

        let found = repo.find_by_email("ann@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(first.id));
    }
}
