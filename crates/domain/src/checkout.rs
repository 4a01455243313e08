//! Checkout transition: converts an active cart into an ordered one while
//! decrementing inventory, or rejects with no side effects.
//!
//! The whole transition runs in a single transaction. Book rows are locked
//! in ascending id order (two overlapping checkouts can never deadlock) and
//! every line item is validated against stock before the first decrement is
//! written, so a failure anywhere rolls back to exactly the pre-checkout
//! state.

use std::sync::Arc;

use store::{BookRepository, CartRepository, Store, StoreTx};

use crate::cart::{self, CartWithItems};
use crate::error::{CartError, DomainError};
use crate::inventory;
use crate::policy::{self, Actor};

/// Orchestrates the order transition for a user's active cart.
pub struct Checkout {
    store: Arc<dyn Store>,
}

impl Checkout {
    /// Creates a new checkout orchestrator over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Marks the actor's active cart as ordered and decrements book stock.
    ///
    /// Preconditions, first failure wins:
    /// 1. the cart is not already ordered;
    /// 2. the cart has at least one line item;
    /// 3. every line item is covered by its book's stock.
    ///
    /// Either every stock decrement and the ordered flag commit together,
    /// or none of them do.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn order_cart(&self, actor: &Actor) -> Result<CartWithItems, DomainError> {
        let (mut tx, mut cart) = cart::open_active_cart(self.store.as_ref(), actor.id).await?;
        if !policy::owns_cart(actor, &cart) {
            return Err(DomainError::CartPermissionDenied);
        }

        if cart.is_ordered {
            metrics::counter!("checkout_rejected_total", "reason" => "already_ordered")
                .increment(1);
            return Err(CartError::AlreadyOrdered.into());
        }

        let mut items = tx.items_for_cart(cart.id).await?;
        if items.is_empty() {
            metrics::counter!("checkout_rejected_total", "reason" => "empty").increment(1);
            return Err(CartError::Empty.into());
        }

        // Lock books in a stable order to rule out lock cycles between
        // concurrent checkouts over overlapping carts.
        items.sort_by_key(|item| item.book_id);

        let mut books = Vec::with_capacity(items.len());
        for item in &items {
            let book = tx
                .get_book_for_update(item.book_id)
                .await?
                .ok_or(CartError::BookNotFound {
                    book_id: item.book_id,
                })?;

            if !inventory::check_available(&book, item.quantity) {
                // Dropping the transaction rolls back; nothing has been
                // decremented for any item, including ones already checked.
                metrics::counter!("checkout_rejected_total", "reason" => "insufficient_stock")
                    .increment(1);
                return Err(CartError::InsufficientStock {
                    name: book.name,
                    available: book.stock,
                }
                .into());
            }

            books.push(book);
        }

        for (item, book) in items.iter().zip(&books) {
            inventory::decrement(&mut *tx, book, item.quantity).await?;
        }

        cart.is_ordered = true;
        tx.save_cart(&cart).await?;
        tx.commit().await?;

        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(cart_id = %cart.id, items = items.len(), "cart ordered");
        Ok(CartWithItems { cart, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use common::{BookId, Money, UserId};
    use store::{Book, MemoryStore, StoreTx};

    async fn seed_book(store: &MemoryStore, name: &str, price_cents: i64, stock: u32) -> BookId {
        let book = Book {
            id: BookId::new(),
            name: name.to_string(),
            author: "Author".to_string(),
            description: None,
            price: Money::from_cents(price_cents),
            stock,
            owner: UserId::new(),
        };
        let mut tx = store.begin().await.unwrap();
        tx.insert_book(&book).await.unwrap();
        tx.commit().await.unwrap();
        book.id
    }

    async fn stock_of(store: &MemoryStore, id: BookId) -> u32 {
        let mut tx = store.begin().await.unwrap();
        tx.get_book(id).await.unwrap().unwrap().stock
    }

    fn services(store: &MemoryStore) -> (CartService, Checkout) {
        let store: Arc<dyn Store> = Arc::new(store.clone());
        (CartService::new(store.clone()), Checkout::new(store))
    }

    #[tokio::test]
    async fn checkout_decrements_stock_and_orders_the_cart() {
        let store = MemoryStore::new();
        let dune = seed_book(&store, "Dune", 1000, 10).await;
        let (carts, checkout) = services(&store);
        let actor = Actor::user(UserId::new());

        carts.upsert_line_item(&actor, dune, 2).await.unwrap();
        let view = checkout.order_cart(&actor).await.unwrap();

        assert!(view.cart.is_ordered);
        assert_eq!(stock_of(&store, dune).await, 8);
    }

    #[tokio::test]
    async fn checkout_of_empty_cart_is_rejected() {
        let store = MemoryStore::new();
        let (carts, checkout) = services(&store);
        let actor = Actor::user(UserId::new());

        let before = carts.active_cart(&actor).await.unwrap();
        let err = checkout.order_cart(&actor).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::Empty)));

        // The cart is unchanged.
        let after = carts.active_cart(&actor).await.unwrap();
        assert_eq!(after.cart, before.cart);
    }

    #[tokio::test]
    async fn second_checkout_finds_no_items_and_mutates_nothing() {
        let store = MemoryStore::new();
        let dune = seed_book(&store, "Dune", 1000, 10).await;
        let (carts, checkout) = services(&store);
        let actor = Actor::user(UserId::new());

        carts.upsert_line_item(&actor, dune, 2).await.unwrap();
        checkout.order_cart(&actor).await.unwrap();

        // Ordering is terminal: the ordered cart is out of reach and the
        // retry fails on the fresh empty cart without touching stock.
        let err = checkout.order_cart(&actor).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::Empty)));
        assert_eq!(stock_of(&store, dune).await, 8);
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_book() {
        let store = MemoryStore::new();
        let dune = seed_book(&store, "Dune", 1000, 1).await;
        let (carts, checkout) = services(&store);
        let actor = Actor::user(UserId::new());

        carts.upsert_line_item(&actor, dune, 3).await.unwrap();
        let err = checkout.order_cart(&actor).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Not enough stock for Dune. Available stock: 1"
        );
        match err {
            DomainError::Cart(CartError::InsufficientStock { name, available }) => {
                assert_eq!(name, "Dune");
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_checkout_is_all_or_nothing() {
        let store = MemoryStore::new();
        // "Arrakis" sorts after "Dune" by id only accidentally; stock makes
        // the second checked item fail regardless of lock order.
        let plenty = seed_book(&store, "Dune", 1000, 10).await;
        let scarce = seed_book(&store, "Arrakis", 500, 1).await;
        let (carts, checkout) = services(&store);
        let actor = Actor::user(UserId::new());

        carts.upsert_line_item(&actor, plenty, 2).await.unwrap();
        carts.upsert_line_item(&actor, scarce, 5).await.unwrap();

        let err = checkout.order_cart(&actor).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::InsufficientStock { .. })
        ));

        // No stock moved for either book and the cart is still active.
        assert_eq!(stock_of(&store, plenty).await, 10);
        assert_eq!(stock_of(&store, scarce).await, 1);
        let view = carts.active_cart(&actor).await.unwrap();
        assert!(!view.cart.is_ordered);
        assert_eq!(view.items.len(), 2);
    }

    #[tokio::test]
    async fn checkout_covers_multiple_items() {
        let store = MemoryStore::new();
        let dune = seed_book(&store, "Dune", 1000, 4).await;
        let emma = seed_book(&store, "Emma", 250, 7).await;
        let (carts, checkout) = services(&store);
        let actor = Actor::user(UserId::new());

        carts.upsert_line_item(&actor, dune, 4).await.unwrap();
        carts.upsert_line_item(&actor, emma, 3).await.unwrap();

        let view = checkout.order_cart(&actor).await.unwrap();

        assert!(view.cart.is_ordered);
        assert_eq!(stock_of(&store, dune).await, 0);
        assert_eq!(stock_of(&store, emma).await, 4);
    }

    #[tokio::test]
    async fn stock_never_goes_negative_across_sequential_checkouts() {
        let store = MemoryStore::new();
        let dune = seed_book(&store, "Dune", 1000, 3).await;

        let alice = Actor::user(UserId::new());
        let bob = Actor::user(UserId::new());

        let (carts, checkout) = services(&store);
        carts.upsert_line_item(&alice, dune, 2).await.unwrap();
        carts.upsert_line_item(&bob, dune, 2).await.unwrap();

        let first = checkout.order_cart(&alice).await;
        let second = checkout.order_cart(&bob).await;

        assert!(first.is_ok());
        assert!(matches!(
            second.unwrap_err(),
            DomainError::Cart(CartError::InsufficientStock { .. })
        ));
        assert_eq!(stock_of(&store, dune).await, 1);
    }
}
