use std::sync::Arc;

use uuid::Uuid;

use crate::access::{self, Actor, Operation};
use crate::domain::Category;
use crate::error::{DomainError, RepoError};
use crate::ports::{CategoryRepository, Clock};

/// Category management.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    clock: Arc<dyn Clock>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { categories, clock }
    }

    pub async fn create(&self, actor: &Actor, name: String) -> Result<Category, DomainError> {
        access::authorize(Some(actor), Operation::CreateCategory)?;

        let category = Category::new(name, self.clock.now())?;
        let category = self.categories.insert(category).await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<Category>, DomainError> {
        access::authorize(None, Operation::ListCategories)?;

        let mut categories = self.categories.find_all().await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Category, DomainError> {
        access::authorize(Some(actor), Operation::ViewCategory)?;

        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::category_not_found(id))
    }

    pub async fn rename(
        &self,
        actor: &Actor,
        id: Uuid,
        name: String,
    ) -> Result<Category, DomainError> {
        access::authorize(Some(actor), Operation::UpdateCategory)?;

        let mut category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::category_not_found(id))?;
        category.rename(name, self.clock.now())?;

        self.categories
            .update(category)
            .await
            .map_err(|e| missing_category(e, id))
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        access::authorize(Some(actor), Operation::DeleteCategory)?;

        self.categories
            .delete(id)
            .await
            .map_err(|e| missing_category(e, id))?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

fn missing_category(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::category_not_found(id),
        other => other.into(),
    }
}
