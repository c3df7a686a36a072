//! Publication scheduler port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// One-shot, cancellable publication timers keyed by post id.
#[async_trait]
pub trait PublicationScheduler: Send + Sync {
    /// Arrange for `post_id` to be published at `at`.
    ///
    /// Instants at or before now are applied immediately. A later
    /// registration for the same post replaces the earlier one.
    async fn schedule(&self, post_id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Drop any pending timer for `post_id`. No-op when there is none.
    async fn cancel(&self, post_id: Uuid);
}
