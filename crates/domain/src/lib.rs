//! Business logic for the bookshop backend.
//!
//! The cart aggregate and the checkout transition carry the system's real
//! invariants: cart totals always equal the sum over their line items, stock
//! never goes negative, and a cart is ordered at most once. Everything runs
//! against the repository traits from the `store` crate, one transaction per
//! operation.

pub mod cart;
pub mod catalog;
pub mod checkout;
mod error;
pub mod inventory;
pub mod policy;

pub use cart::{CartService, CartWithItems};
pub use catalog::{BookDraft, BookPatch, CatalogService};
pub use checkout::Checkout;
pub use error::{CartError, CatalogError, DomainError};
pub use policy::Actor;
