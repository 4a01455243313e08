use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BookId, CartId, CartItemId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{Result, StoreError};
use crate::records::{Book, Cart, CartItem};
use crate::repository::{BookRepository, CartRepository, Store, StoreTx};

// Constraint names shared with the PostgreSQL schema so domain code can
// match conflicts uniformly across backends.
pub(crate) const BOOK_NAME_CONSTRAINT: &str = "books_name_key";
pub(crate) const ACTIVE_CART_CONSTRAINT: &str = "carts_one_active_per_user";

#[derive(Debug, Default, Clone)]
struct State {
    books: HashMap<BookId, Book>,
    carts: HashMap<CartId, Cart>,
    items: HashMap<CartItemId, CartItem>,
}

/// In-memory store implementation for testing and standalone operation.
///
/// Provides the same interface and constraint behavior as the PostgreSQL
/// implementation. Transactions take a single store-wide async mutex and
/// mutate a working copy of the state, written back on commit; this makes
/// them strictly serializable, which satisfies the locking contract of
/// [`Store`] trivially.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
}

#[async_trait]
impl BookRepository for MemoryTx {
    async fn list_books(&mut self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self.work.books.values().cloned().collect();
        books.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(books)
    }

    async fn get_book(&mut self, id: BookId) -> Result<Option<Book>> {
        Ok(self.work.books.get(&id).cloned())
    }

    async fn get_book_for_update(&mut self, id: BookId) -> Result<Option<Book>> {
        // The store-wide mutex already excludes every other transaction.
        Ok(self.work.books.get(&id).cloned())
    }

    async fn insert_book(&mut self, book: &Book) -> Result<()> {
        if self
            .work
            .books
            .values()
            .any(|b| b.id != book.id && b.name == book.name)
        {
            return Err(StoreError::Conflict(BOOK_NAME_CONSTRAINT.to_string()));
        }
        self.work.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn update_book(&mut self, book: &Book) -> Result<bool> {
        if !self.work.books.contains_key(&book.id) {
            return Ok(false);
        }
        if self
            .work
            .books
            .values()
            .any(|b| b.id != book.id && b.name == book.name)
        {
            return Err(StoreError::Conflict(BOOK_NAME_CONSTRAINT.to_string()));
        }
        self.work.books.insert(book.id, book.clone());
        Ok(true)
    }

    async fn save_book_stock(&mut self, id: BookId, stock: u32) -> Result<()> {
        if let Some(book) = self.work.books.get_mut(&id) {
            book.stock = stock;
        }
        Ok(())
    }

    async fn delete_book(&mut self, id: BookId) -> Result<bool> {
        Ok(self.work.books.remove(&id).is_some())
    }
}

#[async_trait]
impl CartRepository for MemoryTx {
    async fn find_active_cart(&mut self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self
            .work
            .carts
            .values()
            .find(|c| c.user_id == user_id && !c.is_ordered)
            .cloned())
    }

    async fn insert_cart(&mut self, cart: &Cart) -> Result<()> {
        if !cart.is_ordered
            && self
                .work
                .carts
                .values()
                .any(|c| c.user_id == cart.user_id && !c.is_ordered)
        {
            return Err(StoreError::Conflict(ACTIVE_CART_CONSTRAINT.to_string()));
        }
        self.work.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        self.work.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn delete_cart(&mut self, id: CartId) -> Result<bool> {
        let existed = self.work.carts.remove(&id).is_some();
        if existed {
            self.work.items.retain(|_, item| item.cart_id != id);
        }
        Ok(existed)
    }

    async fn items_for_cart(&mut self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let mut items: Vec<CartItem> = self
            .work
            .items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn get_item(&mut self, id: CartItemId) -> Result<Option<CartItem>> {
        Ok(self.work.items.get(&id).cloned())
    }

    async fn upsert_item(&mut self, item: &CartItem) -> Result<CartItem> {
        if let Some(existing) = self
            .work
            .items
            .values_mut()
            .find(|i| i.cart_id == item.cart_id && i.book_id == item.book_id)
        {
            existing.quantity = item.quantity;
            existing.price = item.price;
            return Ok(existing.clone());
        }
        self.work.items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn delete_item(&mut self, id: CartItemId) -> Result<bool> {
        Ok(self.work.items.remove(&id).is_some())
    }

    async fn clear_items(&mut self, cart_id: CartId) -> Result<()> {
        self.work.items.retain(|_, item| item.cart_id != cart_id);
        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        *self.guard = self.work;
        Ok(())
    }
}
