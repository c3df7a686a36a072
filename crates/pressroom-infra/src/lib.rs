//! # Pressroom Infrastructure
//!
//! Concrete implementations of the ports defined in `pressroom-core`:
//! stores, token and password services, and the publication scheduler.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL stores via SeaORM
//!
//! Without `postgres` only the in-memory stores are available.

pub mod auth;
pub mod database;
pub mod scheduler;

// Re-exports
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, InMemoryCategoryRepository, InMemoryPostRepository, InMemoryUserRepository,
};
#[cfg(feature = "postgres")]
pub use database::DatabaseConnections;
pub use scheduler::{SchedulerConfig, TokioPublicationScheduler};
