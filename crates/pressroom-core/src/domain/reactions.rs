//! Reaction ledger shared by posts and comments.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Like counter plus the set of identities behind it.
///
/// `likes == liked_by.len()` and every id appears at most once. Both fields
/// only ever change together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    pub likes: u64,
    pub liked_by: Vec<Uuid>,
}

impl Reactions {
    pub fn has_reacted(&self, user_id: Uuid) -> bool {
        self.liked_by.contains(&user_id)
    }

    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.liked_by.len());
        self.likes as usize == self.liked_by.len() && self.liked_by.iter().all(|id| seen.insert(id))
    }

    /// Record a like. Fails without mutating when `user_id` already liked.
    pub fn like(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        if self.has_reacted(user_id) {
            return Err(DomainError::AlreadyReacted);
        }
        let likes = self
            .likes
            .checked_add(1)
            .ok_or_else(|| DomainError::Inconsistent("like counter overflow".to_string()))?;

        self.liked_by.push(user_id);
        self.likes = likes;
        Ok(())
    }

    /// Withdraw a like. Fails without mutating when `user_id` never liked.
    pub fn unlike(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        let position = self
            .liked_by
            .iter()
            .position(|id| *id == user_id)
            .ok_or(DomainError::NotReacted)?;
        let likes = self.likes.checked_sub(1).ok_or_else(|| {
            DomainError::Inconsistent("like counter would become negative".to_string())
        })?;

        self.liked_by.remove(position);
        self.likes = likes;
        Ok(())
    }
}
