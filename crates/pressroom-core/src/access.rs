//! Authorization gate.
//!
//! Role requirements are declared as data in [`POLICY`]; the gate itself is a
//! pair of pure predicates with no state and no I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Role carried by an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::User => "user",
        }
    }

    /// Admins and editors manage content.
    pub fn is_staff(&self) -> bool {
        allowed(*self, STAFF)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "user" => Ok(Role::User),
            other => Err(DomainError::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// The identity a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Operations guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePost,
    PublishPost,
    UpdateDraft,
    UpdatePost,
    DeletePost,
    ViewPost,
    ListPosts,
    SearchPosts,
    AddComment,
    RemoveComment,
    LikePost,
    UnlikePost,
    LikeComment,
    UnlikeComment,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    ViewCategory,
    ListCategories,
}

pub const ADMIN: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Admin, Role::Editor];
pub const MEMBERS: &[Role] = &[Role::Admin, Role::Editor, Role::User];

/// Operation → permitted roles. Operations not listed are public.
pub const POLICY: &[(Operation, &[Role])] = &[
    (Operation::CreatePost, STAFF),
    (Operation::PublishPost, STAFF),
    (Operation::UpdateDraft, STAFF),
    (Operation::UpdatePost, STAFF),
    (Operation::DeletePost, ADMIN),
    (Operation::ViewPost, STAFF),
    (Operation::AddComment, MEMBERS),
    (Operation::RemoveComment, MEMBERS),
    (Operation::LikePost, MEMBERS),
    (Operation::UnlikePost, MEMBERS),
    (Operation::LikeComment, MEMBERS),
    (Operation::UnlikeComment, MEMBERS),
    (Operation::CreateCategory, STAFF),
    (Operation::UpdateCategory, STAFF),
    (Operation::DeleteCategory, STAFF),
    (Operation::ViewCategory, MEMBERS),
];

impl Operation {
    /// Roles permitted to perform this operation, or `None` when it is public.
    pub fn required_roles(self) -> Option<&'static [Role]> {
        POLICY
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, roles)| *roles)
    }
}

/// `role ∈ required`.
pub fn allowed(role: Role, required: &[Role]) -> bool {
    required.contains(&role)
}

/// An identity is present.
pub fn authenticated(identity: Option<&Actor>) -> bool {
    identity.is_some()
}

/// Admit or deny `identity` for `operation`.
pub fn authorize(identity: Option<&Actor>, operation: Operation) -> Result<(), DomainError> {
    let Some(required) = operation.required_roles() else {
        return Ok(());
    };

    let actor = identity.ok_or(DomainError::Unauthenticated)?;
    if allowed(actor.role, required) {
        Ok(())
    } else {
        Err(DomainError::Forbidden {
            allowed: required
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor::new(Uuid::new_v4(), role)
    }

    #[test]
    fn test_allowed_is_membership() {
        assert!(allowed(Role::Admin, ADMIN));
        assert!(!allowed(Role::Editor, ADMIN));
        assert!(allowed(Role::Editor, STAFF));
        assert!(!allowed(Role::User, STAFF));
        assert!(allowed(Role::User, MEMBERS));
        assert!(!allowed(Role::Admin, &[]));
    }

    #[test]
    fn test_authenticated() {
        assert!(authenticated(Some(&actor(Role::User))));
        assert!(!authenticated(None));
    }

    #[test]
    fn test_public_operations_need_no_identity() {
        for op in [
            Operation::ListPosts,
            Operation::SearchPosts,
            Operation::ListCategories,
        ] {
            assert!(op.required_roles().is_none());
            assert!(authorize(None, op).is_ok());
        }
    }

    #[test]
    fn test_missing_identity_is_unauthenticated() {
        let result = authorize(None, Operation::LikePost);
        assert!(matches!(result, Err(DomainError::Unauthenticated)));
    }

    #[test]
    fn test_wrong_role_is_forbidden() {
        let result = authorize(Some(&actor(Role::User)), Operation::CreatePost);
        match result {
            Err(DomainError::Forbidden { allowed }) => assert_eq!(allowed, "admin, editor"),
            other => panic!("expected Forbidden, got {:?}", other),
        }

        let result = authorize(Some(&actor(Role::Editor)), Operation::DeletePost);
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[test]
    fn test_publish_and_draft_updates_are_gated() {
        for op in [Operation::PublishPost, Operation::UpdateDraft] {
            assert_eq!(op.required_roles(), Some(STAFF));
            assert!(authorize(Some(&actor(Role::Editor)), op).is_ok());
            assert!(authorize(Some(&actor(Role::User)), op).is_err());
            assert!(authorize(None, op).is_err());
        }
    }

    #[test]
    fn test_reactions_open_to_every_member() {
        for role in [Role::Admin, Role::Editor, Role::User] {
            for op in [
                Operation::AddComment,
                Operation::RemoveComment,
                Operation::LikePost,
                Operation::UnlikePost,
                Operation::LikeComment,
                Operation::UnlikeComment,
            ] {
                assert!(authorize(Some(&actor(role)), op).is_ok());
            }
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Editor".parse::<Role>().unwrap(), Role::Editor);
        assert!("moderator".parse::<Role>().is_err());
        assert!(Role::Admin.is_staff());
        assert!(!Role::User.is_staff());
    }
}
