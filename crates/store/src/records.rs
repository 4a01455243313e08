use common::{BookId, CartId, CartItemId, Money, UserId};

/// A catalog book.
///
/// `stock` never goes negative: catalog edits validate it and checkout
/// decrements are floor-checked before they are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    /// Unique across the catalog.
    pub name: String,
    pub author: String,
    pub description: Option<String>,
    /// Unit price in cents, non-negative.
    pub price: Money,
    /// Units currently available.
    pub stock: u32,
    /// The superuser who created the book.
    pub owner: UserId,
}

/// A shopping cart.
///
/// At most one cart per user has `is_ordered = false` (the "active" cart).
/// Totals are derived: after every mutation they are recomputed as the sum
/// over the cart's current line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    /// Sum of line-item subtotals.
    pub total_price: Money,
    /// Sum of line-item quantities.
    pub total_quantity: u32,
    /// Set once by checkout; an ordered cart is never mutated again.
    pub is_ordered: bool,
}

impl Cart {
    /// Creates a new empty active cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            total_price: Money::zero(),
            total_quantity: 0,
            is_ordered: false,
        }
    }
}

/// A cart line item; one per `(cart, book)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub book_id: BookId,
    /// Always positive.
    pub quantity: u32,
    /// Denormalized line subtotal: `book.price * quantity` at the time of
    /// the last upsert. Overwritten, never accumulated.
    pub price: Money,
}

impl CartItem {
    /// Creates a new line item with a fresh id.
    pub fn new(cart_id: CartId, book_id: BookId, quantity: u32, price: Money) -> Self {
        Self {
            id: CartItemId::new(),
            cart_id,
            book_id,
            quantity,
            price,
        }
    }
}
