//! Shared types for the bookshop backend.

mod money;
mod types;

pub use money::Money;
pub use types::{BookId, CartId, CartItemId, UserId};
