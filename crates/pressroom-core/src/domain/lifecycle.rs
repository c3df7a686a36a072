//! Post lifecycle state machine.
//!
//! `Draft`, `PendingPublish(at)` and `Published` are encoded in the stored
//! `status` / `published` / `publish_at` triple. Every transition goes
//! through [`Post::enter`], which keeps the triple consistent.

use chrono::{DateTime, Utc};

use super::post::{DraftChanges, Post, PostStatus};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationState {
    Draft,
    PendingPublish(DateTime<Utc>),
    Published,
}

impl PublicationState {
    /// State implied by a requested status and optional publication instant.
    pub fn resolve(
        status: PostStatus,
        publish_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        match (status, publish_at) {
            (PostStatus::Draft, _) => PublicationState::Draft,
            (PostStatus::Published, Some(at)) if at > now => PublicationState::PendingPublish(at),
            (PostStatus::Published, _) => PublicationState::Published,
        }
    }

    pub fn pending_at(&self) -> Option<DateTime<Utc>> {
        match self {
            PublicationState::PendingPublish(at) => Some(*at),
            _ => None,
        }
    }
}

impl Post {
    pub fn state(&self) -> PublicationState {
        match (self.status, self.publish_at) {
            (PostStatus::Draft, _) => PublicationState::Draft,
            (PostStatus::Published, Some(at)) if !self.published => {
                PublicationState::PendingPublish(at)
            }
            (PostStatus::Published, _) => PublicationState::Published,
        }
    }

    pub fn enter(&mut self, state: PublicationState) {
        match state {
            PublicationState::Draft => {
                self.status = PostStatus::Draft;
                self.published = false;
                self.publish_at = None;
            }
            PublicationState::PendingPublish(at) => {
                self.status = PostStatus::Published;
                self.published = false;
                self.publish_at = Some(at);
            }
            PublicationState::Published => {
                self.status = PostStatus::Published;
                self.published = true;
                self.publish_at = None;
            }
        }
    }

    /// Unconditional, idempotent publish.
    pub fn publish_now(&mut self) {
        self.enter(PublicationState::Published);
    }

    /// Apply an update-draft request and return the resulting state.
    ///
    /// Without a status or publish instant the lifecycle is left alone;
    /// otherwise the creation rules decide the new state. A published post
    /// only leaves `Published` by reverting to draft, so a new instant on
    /// its own is ignored.
    pub fn apply_draft_changes(
        &mut self,
        changes: DraftChanges,
        now: DateTime<Utc>,
    ) -> Result<PublicationState, DomainError> {
        self.apply_changes(changes.content, now)?;

        if changes.status.is_none() && changes.publish_at.is_none() {
            return Ok(self.state());
        }

        let status = changes.status.unwrap_or(self.status);
        if self.state() == PublicationState::Published && status == PostStatus::Published {
            return Ok(PublicationState::Published);
        }

        let publish_at = changes.publish_at.or(self.state().pending_at());
        let next = PublicationState::resolve(status, publish_at, now);
        self.enter(next);
        Ok(next)
    }

    /// Publish a pending post whose instant is at or before `instant`.
    /// Returns whether the post changed.
    pub fn settle(&mut self, instant: DateTime<Utc>) -> bool {
        match self.state() {
            PublicationState::PendingPublish(at) if at <= instant => {
                self.publish_now();
                true
            }
            _ => false,
        }
    }

    /// Invariant I1 evaluated at `now`.
    pub fn is_publication_consistent(&self, now: DateTime<Utc>) -> bool {
        let expected = self.status == PostStatus::Published
            && self.publish_at.map_or(true, |at| at <= now);
        self.published == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::{NewPost, PostChanges};
    use chrono::Duration;
    use uuid::Uuid;

    fn post_with(status: Option<PostStatus>, publish_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Post {
        Post::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewPost {
                title: "Title".to_string(),
                content: "Content".to_string(),
                status,
                publish_at,
                ..Default::default()
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_creation_states() {
        let now = Utc::now();

        let draft = post_with(None, Some(now + Duration::hours(1)), now);
        assert_eq!(draft.state(), PublicationState::Draft);
        assert_eq!(draft.publish_at, None);

        let immediate = post_with(Some(PostStatus::Published), None, now);
        assert_eq!(immediate.state(), PublicationState::Published);
        assert!(immediate.published);

        let past = post_with(Some(PostStatus::Published), Some(now - Duration::hours(1)), now);
        assert_eq!(past.state(), PublicationState::Published);
        assert_eq!(past.publish_at, None);

        let at = now + Duration::hours(1);
        let pending = post_with(Some(PostStatus::Published), Some(at), now);
        assert_eq!(pending.state(), PublicationState::PendingPublish(at));
        assert_eq!(pending.status, PostStatus::Published);
        assert!(!pending.published);

        for post in [&draft, &immediate, &past, &pending] {
            assert!(post.is_publication_consistent(now));
        }
    }

    #[test]
    fn test_settle_publishes_only_when_due() {
        let now = Utc::now();
        let at = now + Duration::hours(1);
        let mut post = post_with(Some(PostStatus::Published), Some(at), now);

        assert!(!post.settle(now));
        assert!(!post.published);

        assert!(post.settle(at));
        assert!(post.published);
        assert_eq!(post.publish_at, None);
        assert!(post.is_publication_consistent(at));

        // Already published: nothing left to do.
        assert!(!post.settle(at + Duration::hours(1)));
    }

    #[test]
    fn test_publish_now_is_idempotent() {
        let now = Utc::now();
        let mut post = post_with(Some(PostStatus::Published), Some(now + Duration::days(1)), now);

        post.publish_now();
        let once = post.clone();
        post.publish_now();

        assert_eq!(post, once);
        assert_eq!(post.state(), PublicationState::Published);
        assert!(post.is_publication_consistent(now));
    }

    #[test]
    fn test_draft_update_into_future_publish() {
        let now = Utc::now();
        let mut post = post_with(None, None, now);
        let at = now + Duration::hours(2);

        let state = post
            .apply_draft_changes(
                DraftChanges {
                    status: Some(PostStatus::Published),
                    publish_at: Some(at),
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        assert_eq!(state, PublicationState::PendingPublish(at));
        assert!(post.is_publication_consistent(now));
    }

    #[test]
    fn test_draft_update_with_past_instant_publishes_immediately() {
        let now = Utc::now();
        let mut post = post_with(Some(PostStatus::Published), Some(now + Duration::hours(1)), now);

        let state = post
            .apply_draft_changes(
                DraftChanges {
                    publish_at: Some(now - Duration::minutes(1)),
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        assert_eq!(state, PublicationState::Published);
        assert!(post.published);
        assert_eq!(post.publish_at, None);
    }

    #[test]
    fn test_revert_to_draft_clears_schedule() {
        let now = Utc::now();
        let mut post = post_with(Some(PostStatus::Published), Some(now + Duration::hours(1)), now);

        let state = post
            .apply_draft_changes(
                DraftChanges {
                    status: Some(PostStatus::Draft),
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        assert_eq!(state, PublicationState::Draft);
        assert_eq!(post.publish_at, None);
        assert!(!post.published);
    }

    #[test]
    fn test_content_only_draft_update_keeps_state() {
        let now = Utc::now();
        let at = now + Duration::hours(1);
        let mut post = post_with(Some(PostStatus::Published), Some(at), now);

        let state = post
            .apply_draft_changes(
                DraftChanges {
                    content: PostChanges {
                        title: Some("Renamed".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        assert_eq!(state, PublicationState::PendingPublish(at));
        assert_eq!(post.title, "Renamed");
    }

    #[test]
    fn test_status_only_update_keeps_pending_instant() {
        let now = Utc::now();
        let at = now + Duration::hours(1);
        let mut post = post_with(Some(PostStatus::Published), Some(at), now);

        let state = post
            .apply_draft_changes(
                DraftChanges {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        assert_eq!(state, PublicationState::PendingPublish(at));
    }

    #[test]
    fn test_future_instant_does_not_unpublish() {
        let now = Utc::now();
        let mut post = post_with(Some(PostStatus::Published), None, now);
        let later = now + Duration::hours(3);

        for status in [None, Some(PostStatus::Published)] {
            let state = post
                .apply_draft_changes(
                    DraftChanges {
                        status,
                        publish_at: Some(later),
                        ..Default::default()
                    },
                    now,
                )
                .unwrap();

            assert_eq!(state, PublicationState::Published);
            assert!(post.published);
            assert_eq!(post.publish_at, None);
        }
    }

    #[test]
    fn test_invariant_holds_across_sequences() {
        let start = Utc::now();
        let mut clock = start;
        let mut post = post_with(None, None, clock);
        let steps: Vec<Box<dyn Fn(&mut Post, DateTime<Utc>)>> = vec![
            Box::new(|p, now| {
                p.apply_draft_changes(
                    DraftChanges {
                        status: Some(PostStatus::Published),
                        publish_at: Some(now + Duration::minutes(30)),
                        ..Default::default()
                    },
                    now,
                )
                .unwrap();
            }),
            Box::new(|p, now| {
                p.settle(now);
            }),
            Box::new(|p, now| {
                p.apply_draft_changes(
                    DraftChanges {
                        status: Some(PostStatus::Draft),
                        ..Default::default()
                    },
                    now,
                )
                .unwrap();
            }),
            Box::new(|p, _| p.publish_now()),
            Box::new(|p, now| {
                p.apply_draft_changes(
                    DraftChanges {
                        publish_at: Some(now + Duration::minutes(5)),
                        ..Default::default()
                    },
                    now,
                )
                .unwrap();
            }),
        ];

        for round in 0..3 {
            for step in &steps {
                step(&mut post, clock);
                post.settle(clock);
                assert!(
                    post.is_publication_consistent(clock),
                    "round {} broke I1: {:?}",
                    round,
                    post
                );
                clock += Duration::minutes(20);
            }
        }
    }
}
