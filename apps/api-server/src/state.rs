//! Application state - shared across all handlers.

use std::sync::Arc;

use pressroom_core::domain::User;
use pressroom_core::ports::{
    CategoryRepository, Clock, PasswordService, PostRepository, SystemClock, UserRepository,
};
use pressroom_core::services::{CategoryService, PostService};
use pressroom_core::Role;
use pressroom_infra::{
    DatabaseConfig, InMemoryCategoryRepository, InMemoryPostRepository, InMemoryUserRepository,
    SchedulerConfig, TokioPublicationScheduler,
};

#[cfg(feature = "postgres")]
use pressroom_infra::DatabaseConnections;
#[cfg(feature = "postgres")]
use pressroom_infra::database::{
    PostgresCategoryRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::BootstrapAdmin;

/// The three stores behind the services.
#[derive(Clone)]
pub struct Stores {
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            posts: Arc::new(InMemoryPostRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }

    /// Postgres when configured and reachable, otherwise in-memory.
    pub async fn connect(db_config: Option<&DatabaseConfig>) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(config) = db_config {
            match DatabaseConnections::init(config).await {
                Ok(connections) => {
                    let conn = connections.main;
                    return Self {
                        posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                        categories: Arc::new(PostgresCategoryRepository::new(conn.clone())),
                        users: Arc::new(PostgresUserRepository::new(conn)),
                    };
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    return Self::in_memory();
                }
            }
        }

        #[cfg(not(feature = "postgres"))]
        if db_config.is_some() {
            tracing::warn!("DATABASE_URL set but built without the postgres feature");
        }

        tracing::warn!("Running without database (in-memory mode). Data is lost on restart.");
        Self::in_memory()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub categories: CategoryService,
    pub users: Arc<dyn UserRepository>,
    pub scheduler: TokioPublicationScheduler,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>, scheduler: SchedulerConfig) -> Self {
        let stores = Stores::connect(db_config).await;
        let state = Self::from_stores(stores, Arc::new(SystemClock), scheduler);
        tracing::info!("Application state initialized");
        state
    }

    /// Wire services over the given stores and clock.
    pub fn from_stores(stores: Stores, clock: Arc<dyn Clock>, scheduler: SchedulerConfig) -> Self {
        let publication =
            TokioPublicationScheduler::new(stores.posts.clone(), clock.clone(), scheduler);

        Self {
            posts: PostService::new(
                stores.posts,
                stores.categories.clone(),
                Arc::new(publication.clone()),
                clock.clone(),
            ),
            categories: CategoryService::new(stores.categories, clock),
            users: stores.users,
            scheduler: publication,
        }
    }

    /// Create the configured admin account unless that email is taken.
    pub async fn bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
        passwords: &dyn PasswordService,
    ) -> anyhow::Result<()> {
        let email = admin.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            tracing::debug!("Bootstrap admin already present");
            return Ok(());
        }

        let hash = passwords.hash(&admin.password)?;
        let username = email.split('@').next().unwrap_or("admin").to_string();
        let user = self
            .users
            .insert(User::new(username, email, hash, Role::Admin))
            .await?;

        tracing::info!(user_id = %user.id, "Bootstrap admin created");
        Ok(())
    }
}
