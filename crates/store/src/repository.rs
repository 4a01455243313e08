use async_trait::async_trait;
use common::{BookId, CartId, CartItemId, UserId};

use crate::error::Result;
use crate::records::{Book, Cart, CartItem};

/// Repository over catalog books, scoped to one open transaction.
#[async_trait]
pub trait BookRepository: Send {
    /// Returns all books, ordered by name.
    async fn list_books(&mut self) -> Result<Vec<Book>>;

    /// Returns a book by id, if it exists.
    async fn get_book(&mut self, id: BookId) -> Result<Option<Book>>;

    /// Returns a book by id, locking its row for the remainder of the
    /// transaction so a concurrent checkout or catalog edit cannot read the
    /// same stock value.
    async fn get_book_for_update(&mut self, id: BookId) -> Result<Option<Book>>;

    /// Inserts a new book. Fails with [`crate::StoreError::Conflict`] when
    /// the name is already taken.
    async fn insert_book(&mut self, book: &Book) -> Result<()>;

    /// Overwrites an existing book row. Returns false if no row matched.
    async fn update_book(&mut self, book: &Book) -> Result<bool>;

    /// Writes a new stock level for a book. Used only by the inventory
    /// ledger's decrement.
    async fn save_book_stock(&mut self, id: BookId, stock: u32) -> Result<()>;

    /// Deletes a book. Returns false if no row matched.
    async fn delete_book(&mut self, id: BookId) -> Result<bool>;
}

/// Repository over carts and their line items, scoped to one open
/// transaction.
#[async_trait]
pub trait CartRepository: Send {
    /// Returns the user's active (`is_ordered = false`) cart, locking its
    /// row for the remainder of the transaction.
    async fn find_active_cart(&mut self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts a new cart. Fails with [`crate::StoreError::Conflict`] when
    /// the user already has an active cart.
    async fn insert_cart(&mut self, cart: &Cart) -> Result<()>;

    /// Persists a cart's totals and ordered flag.
    async fn save_cart(&mut self, cart: &Cart) -> Result<()>;

    /// Deletes a cart and, by cascade, all its items. Returns false if no
    /// row matched.
    async fn delete_cart(&mut self, id: CartId) -> Result<bool>;

    /// Returns all line items of a cart, ordered by item id.
    async fn items_for_cart(&mut self, cart_id: CartId) -> Result<Vec<CartItem>>;

    /// Returns a line item by id, if it exists.
    async fn get_item(&mut self, id: CartItemId) -> Result<Option<CartItem>>;

    /// Inserts the line item, or, when one already exists for the same
    /// `(cart, book)` pair, overwrites that item's quantity and price.
    /// Returns the stored row (the existing item's id survives an upsert).
    async fn upsert_item(&mut self, item: &CartItem) -> Result<CartItem>;

    /// Deletes a line item. Returns false if no row matched.
    async fn delete_item(&mut self, id: CartItemId) -> Result<bool>;

    /// Deletes every line item of a cart.
    async fn clear_items(&mut self, cart_id: CartId) -> Result<()>;
}

/// One open store transaction.
///
/// All reads and writes issued through the repository traits happen inside
/// the transaction; nothing is visible to other transactions until
/// [`StoreTx::commit`]. Dropping the handle without committing rolls every
/// write back.
#[async_trait]
pub trait StoreTx: BookRepository + CartRepository + Send {
    /// Commits the transaction.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// A persistent store that hands out transactions.
///
/// Implementations must make transactions serializable with respect to the
/// rows they read-then-write: two transactions touching the same cart or the
/// same book's stock may not interleave.
#[async_trait]
pub trait Store: Send + Sync {
    /// Begins a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}
