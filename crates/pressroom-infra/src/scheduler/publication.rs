//! One-shot publication timers.
//!
//! Each pending post owns at most one timer task, tagged with a ticket. A
//! timer may only fire after claiming its ticket from the job table, so a
//! replaced or cancelled timer that already woke up finds someone else's
//! ticket (or none) and exits. Once claimed, the publish runs inside the
//! store's per-post critical section and only applies if the post is still
//! pending for an instant at or before the timer's own. A post found pending
//! for a later instant gets a fresh timer for that instant.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use pressroom_core::domain::{Post, PostFilter};
use pressroom_core::error::DomainError;
use pressroom_core::ports::{Clock, PostRepository, PublicationScheduler};

use super::SchedulerConfig;

struct PendingPublication {
    ticket: u64,
    at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

struct Inner {
    posts: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    next_ticket: AtomicU64,
    jobs: Mutex<HashMap<Uuid, PendingPublication>>,
}

/// [`PublicationScheduler`] running each timer as a tokio task.
///
/// Timers live in process memory; [`TokioPublicationScheduler::recover`]
/// re-arms them from the store after a restart.
#[derive(Clone)]
pub struct TokioPublicationScheduler {
    inner: Arc<Inner>,
}

impl TokioPublicationScheduler {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                posts,
                clock,
                config,
                next_ticket: AtomicU64::new(1),
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Re-arm timers for every post the store still holds as pending.
    /// Returns how many posts were scheduled or published.
    pub async fn recover(&self) -> Result<usize, DomainError> {
        let posts = self.inner.posts.find_matching(&PostFilter::default()).await?;

        let mut recovered = 0;
        for post in posts {
            if let Some(at) = post.state().pending_at() {
                self.schedule(post.id, at).await?;
                recovered += 1;
            }
        }

        tracing::info!(recovered, "Publication timers recovered");
        Ok(recovered)
    }

    /// Instant the timer for `post_id` is armed for, if any.
    pub async fn pending_at(&self, post_id: Uuid) -> Option<DateTime<Utc>> {
        self.inner.jobs.lock().await.get(&post_id).map(|job| job.at)
    }

    /// Number of armed timers.
    pub async fn pending_count(&self) -> usize {
        self.inner.jobs.lock().await.len()
    }

    /// Abort every armed timer.
    pub async fn shutdown(&self) {
        let mut jobs = self.inner.jobs.lock().await;
        for (_, job) in jobs.drain() {
            job.handle.abort();
        }
        tracing::info!("Publication scheduler stopped");
    }
}

/// What a settle attempt left behind in the store.
#[derive(Debug)]
enum Settled {
    Published,
    /// Still pending, for an instant after the one that was tried.
    Pending(DateTime<Utc>),
    Idle,
}

impl Inner {
    /// Take ownership of the firing for `post_id` if `ticket` is still current.
    async fn claim(&self, post_id: Uuid, ticket: u64) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.get(&post_id) {
            Some(job) if job.ticket == ticket => {
                jobs.remove(&post_id);
                true
            }
            _ => false,
        }
    }

    /// Publish `post_id` if it is still pending for an instant at or before `at`.
    async fn publish_due(&self, post_id: Uuid, at: DateTime<Utc>) -> Result<Settled, DomainError> {
        let mut settled = Settled::Idle;
        let result = self
            .posts
            .update_with(post_id, &mut |post: &mut Post| {
                settled = if post.settle(at) {
                    Settled::Published
                } else {
                    post.state()
                        .pending_at()
                        .map_or(Settled::Idle, Settled::Pending)
                };
                Ok(())
            })
            .await;

        match result {
            Ok(_) => Ok(settled),
            // Deleted before its time came.
            Err(DomainError::NotFound { .. }) => Ok(Settled::Idle),
            Err(e) => Err(e),
        }
    }

    /// Spawn the timer task for one registration. The caller inserts the
    /// returned handle into `jobs` before releasing the lock.
    fn spawn_timer(self: &Arc<Self>, post_id: Uuid, ticket: u64, at: DateTime<Utc>) -> JoinHandle<()> {
        let delay = (at - self.clock.now()).to_std().unwrap_or_default();
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if inner.claim(post_id, ticket).await {
                inner.fire(post_id, at).await;
            }
        })
    }

    /// Register a timer for `at`, returning the registration it replaced.
    fn arm(
        self: &Arc<Self>,
        jobs: &mut HashMap<Uuid, PendingPublication>,
        post_id: Uuid,
        at: DateTime<Utc>,
    ) -> Option<PendingPublication> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let handle = self.spawn_timer(post_id, ticket, at);
        jobs.insert(
            post_id,
            PendingPublication {
                ticket,
                at,
                handle,
            },
        )
    }

    /// Follow a post whose stored instant moved past the timer that just ran.
    /// A registration made in the meantime is newer and wins.
    async fn rearm(self: &Arc<Self>, post_id: Uuid, at: DateTime<Utc>) {
        if !self.config.enabled {
            return;
        }
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(&post_id) {
            return;
        }
        self.arm(&mut jobs, post_id, at);
        tracing::debug!(post_id = %post_id, publish_at = %at, "Publication timer re-armed");
    }

    async fn fire(self: &Arc<Self>, post_id: Uuid, at: DateTime<Utc>) {
        match self.publish_due(post_id, at).await {
            Ok(Settled::Published) => {
                tracing::info!(post_id = %post_id, publish_at = %at, "Scheduled post published")
            }
            Ok(Settled::Pending(later)) => self.rearm(post_id, later).await,
            Ok(Settled::Idle) => tracing::debug!(post_id = %post_id, "Stale publication timer ignored"),
            Err(e) => tracing::error!(post_id = %post_id, error = %e, "Scheduled publication failed"),
        }
    }
}

#[async_trait]
impl PublicationScheduler for TokioPublicationScheduler {
    async fn schedule(&self, post_id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let now = self.inner.clock.now();

        if at <= now {
            self.cancel(post_id).await;
            match self.inner.publish_due(post_id, at).await? {
                Settled::Published => {
                    tracing::info!(post_id = %post_id, publish_at = %at, "Overdue post published")
                }
                Settled::Pending(later) => self.inner.rearm(post_id, later).await,
                Settled::Idle => {}
            }
            return Ok(());
        }

        if !self.inner.config.enabled {
            tracing::debug!(post_id = %post_id, "Scheduler disabled, timer not armed");
            return Ok(());
        }

        // The new task cannot claim its ticket until its entry is in place,
        // since claiming needs this lock.
        let mut jobs = self.inner.jobs.lock().await;
        if let Some(previous) = self.inner.arm(&mut jobs, post_id, at) {
            previous.handle.abort();
            tracing::debug!(post_id = %post_id, replaced = %previous.at, "Publication timer replaced");
        }

        tracing::info!(
            post_id = %post_id,
            publish_at = %at,
            delay_secs = (at - now).num_seconds(),
            "Publication scheduled"
        );
        Ok(())
    }

    async fn cancel(&self, post_id: Uuid) {
        if let Some(job) = self.inner.jobs.lock().await.remove(&post_id) {
            job.handle.abort();
            tracing::debug!(post_id = %post_id, publish_at = %job.at, "Publication timer cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryPostRepository;
    use chrono::Duration;
    use pressroom_core::domain::{NewPost, PostStatus, PublicationState};
    use pressroom_core::ports::{BaseRepository, ManualClock};

    struct Fixture {
        posts: Arc<InMemoryPostRepository>,
        clock: Arc<ManualClock>,
        scheduler: TokioPublicationScheduler,
    }

    fn fixture() -> Fixture {
        let posts = Arc::new(InMemoryPostRepository::new());
        let clock = Arc::new(ManualClock::default());
        let scheduler =
            TokioPublicationScheduler::new(posts.clone(), clock.clone(), SchedulerConfig::default());
        Fixture {
            posts,
            clock,
            scheduler,
        }
    }

    async fn pending_post(f: &Fixture, at: DateTime<Utc>) -> Post {
        let post = Post::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewPost {
                title: "Scheduled".to_string(),
                content: "Body".to_string(),
                status: Some(PostStatus::Published),
                publish_at: Some(at),
                ..Default::default()
            },
            f.clock.now(),
        )
        .unwrap();
        f.posts.insert(post).await.unwrap()
    }

    async fn stored(f: &Fixture, id: Uuid) -> Option<Post> {
        f.posts.find_by_id(id).await.unwrap()
    }

    /// Let paused time run past `secs` so due timers get to fire.
    async fn run_for(f: &Fixture, secs: i64) {
        tokio::time::sleep(std::time::Duration::from_secs(secs as u64)).await;
        f.clock.advance(Duration::seconds(secs));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_publishes_when_due() {
        let f = fixture();
        let at = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, at).await;

        f.scheduler.schedule(post.id, at).await.unwrap();
        assert_eq!(f.scheduler.pending_at(post.id).await, Some(at));

        run_for(&f, 5).await;
        assert!(!stored(&f, post.id).await.unwrap().published);

        run_for(&f, 6).await;
        let post = stored(&f, post.id).await.unwrap();
        assert!(post.published);
        assert_eq!(post.publish_at, None);
        assert_eq!(f.scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_earlier_timer() {
        let f = fixture();
        let t1 = f.clock.now() + Duration::seconds(10);
        let t2 = f.clock.now() + Duration::seconds(30);
        let post = pending_post(&f, t1).await;
        f.scheduler.schedule(post.id, t1).await.unwrap();

        f.posts
            .update_with(post.id, &mut |p: &mut Post| {
                p.enter(PublicationState::PendingPublish(t2));
                Ok(())
            })
            .await
            .unwrap();
        f.scheduler.schedule(post.id, t2).await.unwrap();
        assert_eq!(f.scheduler.pending_count().await, 1);

        run_for(&f, 15).await;
        let current = stored(&f, post.id).await.unwrap();
        assert_eq!(current.state(), PublicationState::PendingPublish(t2));

        run_for(&f, 20).await;
        assert!(stored(&f, post.id).await.unwrap().published);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let f = fixture();
        let at = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, at).await;

        f.scheduler.schedule(post.id, at).await.unwrap();
        f.scheduler.cancel(post.id).await;
        f.scheduler.cancel(post.id).await;

        run_for(&f, 60).await;
        let current = stored(&f, post.id).await.unwrap();
        assert!(!current.published);
        assert_eq!(current.state(), PublicationState::PendingPublish(at));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_leaves_draft_alone() {
        let f = fixture();
        let at = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, at).await;
        f.scheduler.schedule(post.id, at).await.unwrap();

        // Reverted without cancelling; the timer must still be a no-op.
        f.posts
            .update_with(post.id, &mut |p: &mut Post| {
                p.enter(PublicationState::Draft);
                Ok(())
            })
            .await
            .unwrap();

        run_for(&f, 11).await;
        let current = stored(&f, post.id).await.unwrap();
        assert_eq!(current.state(), PublicationState::Draft);
        assert!(!current.published);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_post_timer_is_harmless() {
        let f = fixture();
        let at = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, at).await;
        f.scheduler.schedule(post.id, at).await.unwrap();

        f.posts.delete(post.id).await.unwrap();

        run_for(&f, 11).await;
        assert!(stored(&f, post.id).await.is_none());
        assert_eq!(f.scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_instant_applies_immediately() {
        let f = fixture();
        let at = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, at).await;

        f.clock.advance(Duration::seconds(20));
        f.scheduler.schedule(post.id, at).await.unwrap();

        assert!(stored(&f, post.id).await.unwrap().published);
        assert_eq!(f.scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_scheduler_arms_nothing() {
        let posts = Arc::new(InMemoryPostRepository::new());
        let clock = Arc::new(ManualClock::default());
        let scheduler = TokioPublicationScheduler::new(
            posts.clone(),
            clock.clone(),
            SchedulerConfig { enabled: false },
        );
        let f = Fixture {
            posts,
            clock,
            scheduler,
        };
        let at = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, at).await;

        f.scheduler.schedule(post.id, at).await.unwrap();
        assert_eq!(f.scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_rearms_pending_posts() {
        let f = fixture();
        let at = f.clock.now() + Duration::seconds(10);
        let pending = pending_post(&f, at).await;
        let draft = Post::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewPost {
                title: "Draft".to_string(),
                content: "Body".to_string(),
                ..Default::default()
            },
            f.clock.now(),
        )
        .unwrap();
        f.posts.insert(draft).await.unwrap();

        assert_eq!(f.scheduler.recover().await.unwrap(), 1);
        assert_eq!(f.scheduler.pending_at(pending.id).await, Some(at));

        run_for(&f, 11).await;
        assert!(stored(&f, pending.id).await.unwrap().published);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_schedule_still_publishes() {
        let f = fixture();
        let stored_at = f.clock.now() + Duration::seconds(30);
        let early = f.clock.now() + Duration::seconds(10);
        let post = pending_post(&f, stored_at).await;

        // Registrations land in the opposite order to the store commits.
        f.scheduler.schedule(post.id, stored_at).await.unwrap();
        f.scheduler.schedule(post.id, early).await.unwrap();

        run_for(&f, 15).await;
        let current = stored(&f, post.id).await.unwrap();
        assert_eq!(current.state(), PublicationState::PendingPublish(stored_at));
        assert_eq!(f.scheduler.pending_at(post.id).await, Some(stored_at));

        run_for(&f, 60).await;
        let current = stored(&f, post.id).await.unwrap();
        assert!(current.published);
        assert_eq!(current.publish_at, None);
        assert_eq!(f.scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_schedule_follows_later_instant() {
        let f = fixture();
        let stored_at = f.clock.now() + Duration::seconds(30);
        let post = pending_post(&f, stored_at).await;

        f.scheduler
            .schedule(post.id, f.clock.now() - Duration::seconds(1))
            .await
            .unwrap();
        assert!(!stored(&f, post.id).await.unwrap().published);
        assert_eq!(f.scheduler.pending_at(post.id).await, Some(stored_at));

        run_for(&f, 31).await;
        assert!(stored(&f, post.id).await.unwrap().published);
    }
}
