//! Domain error taxonomy.
//!
//! Every expected outcome (validation, not-found, permission, conflict) is a
//! value, not a panic; the API layer maps each variant onto a status code
//! and response envelope.

use common::{BookId, CartItemId};
use store::StoreError;
use thiserror::Error;

/// Errors raised by the cart aggregate and the checkout transition.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity was zero, negative, or out of range.
    #[error("Quantity must be a positive integer.")]
    InvalidQuantity,

    /// A line subtotal or the cart totals would exceed their representable
    /// range.
    #[error("Cart totals are too large to process.")]
    TotalsOutOfRange,

    /// The referenced book does not exist.
    #[error("No book found with id {book_id}.")]
    BookNotFound { book_id: BookId },

    /// The referenced line item does not exist in the user's active cart.
    #[error("No cart item found with id {item_id}.")]
    ItemNotFound { item_id: CartItemId },

    /// The user has no active cart to operate on.
    #[error("Active cart not found.")]
    NoActiveCart,

    /// Checkout was attempted on a cart that is already ordered.
    #[error("This cart has already been ordered.")]
    AlreadyOrdered,

    /// Checkout was attempted on a cart with no line items.
    #[error("Your cart is empty. Please add items before placing an order.")]
    Empty,

    /// A line item asks for more units than the book has in stock.
    #[error("Not enough stock for {name}. Available stock: {available}")]
    InsufficientStock { name: String, available: u32 },
}

/// Errors raised by catalog management.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The referenced book does not exist.
    #[error("No book found with id {book_id}.")]
    NotFound { book_id: BookId },

    /// The acting user is not allowed to mutate the catalog.
    #[error("Only superusers can manage books.")]
    PermissionDenied,

    /// Another book already carries this name.
    #[error("A book named {name:?} already exists.")]
    DuplicateName { name: String },

    /// Malformed catalog input (empty name, negative price, ...).
    #[error("{0}")]
    Validation(String),
}

/// Top-level error for domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The acting user may not touch the resource.
    #[error("You do not have the required permissions to access this cart.")]
    CartPermissionDenied,

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A domain invariant was breached; indicates a concurrency-control
    /// defect, not a user error.
    #[error("Invariant violation: {0}")]
    Invariant(String),
}
