//! Access policy: pure predicates over the acting user and a resource.
//!
//! Centralizes the authorization rules so they are testable on their own and
//! consumed uniformly by every mutating operation.

use common::UserId;
use store::Cart;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub is_superuser: bool,
}

impl Actor {
    /// Creates an ordinary (non-superuser) actor.
    pub fn user(id: UserId) -> Self {
        Self {
            id,
            is_superuser: false,
        }
    }

    /// Creates a superuser actor.
    pub fn superuser(id: UserId) -> Self {
        Self {
            id,
            is_superuser: true,
        }
    }
}

/// Only superusers may create, edit, or delete catalog books.
pub fn can_mutate_catalog(actor: &Actor) -> bool {
    actor.is_superuser
}

/// A cart may only be read or mutated by its owner.
pub fn owns_cart(actor: &Actor, cart: &Cart) -> bool {
    cart.user_id == actor.id
}
