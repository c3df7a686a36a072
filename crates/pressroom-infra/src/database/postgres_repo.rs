//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use pressroom_core::domain::{Category, Post, PostFilter, User};
use pressroom_core::error::{DomainError, RepoError};
use pressroom_core::ports::{CategoryRepository, PostMutation, PostRepository, UserRepository};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// Re-reads allowed before a contended post update gives up.
const MAX_CAS_ATTEMPTS: u32 = 16;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// Log-safe form of an address: first character of the local part plus the domain.
pub(crate) fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.chars().count() > 1 => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        Some((_, domain)) => format!("***@{}", domain),
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let masked = mask_email(email);
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        result.map(User::try_from).transpose()
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let active: category::ActiveModel = category.into();
        let model = active.update(&self.db).await.map_err(repo_err)?;

        Category::try_from(model)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_matching(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find();
        if let Some(category_id) = filter.category_id {
            query = query.filter(post::Column::CategoryId.eq(category_id));
        }

        let models = query.all(&self.db).await.map_err(repo_err)?;

        // Tags are JSONB; the substring match runs here rather than in SQL.
        let mut posts = Vec::with_capacity(models.len());
        for model in models {
            let post = Post::try_from(model)?;
            if filter.matches(&post) {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    async fn update_with(
        &self,
        id: Uuid,
        mutation: &mut PostMutation<'_>,
    ) -> Result<Post, DomainError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let model = PostEntity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(repo_err)?
                .ok_or_else(|| DomainError::post_not_found(id))?;
            let version = model.version;

            let mut next = Post::try_from(model)?;
            mutation(&mut next)?;

            let mut active: post::ActiveModel = next.clone().into();
            active.version = Set(version + 1);

            let result = PostEntity::update_many()
                .set(active)
                .filter(post::Column::Id.eq(id))
                .filter(post::Column::Version.eq(version))
                .exec(&self.db)
                .await
                .map_err(repo_err)?;

            if result.rows_affected == 1 {
                return Ok(next);
            }
            tracing::debug!(post_id = %id, attempt, "Post changed concurrently, retrying");
        }

        tracing::warn!(post_id = %id, "Post update gave up after repeated conflicts");
        Err(RepoError::Conflict(format!("post {} kept changing during update", id)).into())
    }
}
