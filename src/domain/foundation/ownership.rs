//! Ownership trait for user-owned aggregates.
//!
//! Orders and payments belong to exactly one user. Handlers check ownership
//! before exposing or mutating them; administrators bypass the check through
//! [`Actor`].

use serde::{Deserialize, Serialize};

use super::UserId;

/// Role of the caller as asserted by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// An already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Trait for aggregates that have a single owner.
pub trait OwnedByUser {
    /// Returns the ID of the user who owns this resource.
    fn owner_id(&self) -> &UserId;

    fn is_owner(&self, user_id: &UserId) -> bool {
        self.owner_id() == user_id
    }

    /// True when the actor owns the resource or is an administrator.
    fn is_visible_to(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.is_owner(&actor.user_id)
    }
}
