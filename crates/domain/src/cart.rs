//! Cart aggregate: single active cart per user, derived totals.
//!
//! Every operation runs inside one store transaction so that concurrent
//! mutations of the same cart serialize on its row. Totals are recomputed
//! from scratch over all current line items after every mutation; the
//! O(item count) scan is the simplest way to keep the sum invariant true
//! under interleaved upserts, and carts are small.

use std::sync::Arc;

use common::{BookId, CartItemId, Money, UserId};
use store::{BookRepository, Cart, CartItem, CartRepository, Store, StoreError, StoreTx};

use crate::error::{CartError, DomainError};
use crate::policy::{self, Actor};

/// A cart together with its line items, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

/// Recomputes a cart's derived totals as the sum over its current items.
///
/// Checked: per-item quantities each fit a `u32`, but their sum may not, so
/// both totals are accumulated without wrapping and a cart whose totals
/// leave the representable range is rejected.
pub(crate) fn recompute_totals(cart: &mut Cart, items: &[CartItem]) -> Result<(), CartError> {
    let quantity: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
    let quantity = u32::try_from(quantity).map_err(|_| CartError::TotalsOutOfRange)?;

    let mut price = Money::zero();
    for item in items {
        price = price
            .checked_add(item.price)
            .ok_or(CartError::TotalsOutOfRange)?;
    }

    cart.total_quantity = quantity;
    cart.total_price = price;
    Ok(())
}

/// Opens a transaction positioned on the user's active cart, creating the
/// cart if none exists.
///
/// Race-safe: when two first requests arrive concurrently, one insert loses
/// against the single-active-cart constraint; the loser retries the lookup
/// in a fresh transaction and finds the winner's cart.
pub(crate) async fn open_active_cart(
    store: &dyn Store,
    user_id: UserId,
) -> Result<(Box<dyn StoreTx>, Cart), DomainError> {
    for _ in 0..2 {
        let mut tx = store.begin().await?;

        if let Some(cart) = tx.find_active_cart(user_id).await? {
            return Ok((tx, cart));
        }

        let cart = Cart::new(user_id);
        match tx.insert_cart(&cart).await {
            Ok(()) => return Ok((tx, cart)),
            Err(StoreError::Conflict(_)) => {
                // Another request created the cart first; the conflict may
                // have poisoned this transaction, so retry with a new one.
                drop(tx);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(DomainError::Invariant(format!(
        "active cart for user {user_id} unresolvable after insert conflict"
    )))
}

/// High-level API for cart operations.
pub struct CartService {
    store: Arc<dyn Store>,
}

impl CartService {
    /// Creates a new cart service over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the actor's active cart and its items, creating the cart on
    /// first access.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn active_cart(&self, actor: &Actor) -> Result<CartWithItems, DomainError> {
        let (mut tx, cart) = open_active_cart(self.store.as_ref(), actor.id).await?;
        let items = tx.items_for_cart(cart.id).await?;
        tx.commit().await?;

        Ok(CartWithItems { cart, items })
    }

    /// Adds a book to the cart or updates its line item.
    ///
    /// If no item exists for the `(cart, book)` pair one is created;
    /// otherwise its quantity and price are overwritten, not incremented.
    /// The line price is always `book.price * quantity`, and the cart totals
    /// are recomputed over all items before the transaction commits.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn upsert_line_item(
        &self,
        actor: &Actor,
        book_id: BookId,
        quantity: i64,
    ) -> Result<CartWithItems, DomainError> {
        let quantity: u32 = match quantity.try_into() {
            Ok(q) if q > 0 => q,
            _ => return Err(CartError::InvalidQuantity.into()),
        };

        let (mut tx, mut cart) = open_active_cart(self.store.as_ref(), actor.id).await?;
        if !policy::owns_cart(actor, &cart) {
            return Err(DomainError::CartPermissionDenied);
        }

        let book = tx
            .get_book(book_id)
            .await?
            .ok_or(CartError::BookNotFound { book_id })?;

        let price = book
            .price
            .multiply(quantity)
            .ok_or(CartError::TotalsOutOfRange)?;
        let item = CartItem::new(cart.id, book.id, quantity, price);
        tx.upsert_item(&item).await?;

        let items = tx.items_for_cart(cart.id).await?;
        recompute_totals(&mut cart, &items)?;
        tx.save_cart(&cart).await?;
        tx.commit().await?;

        tracing::debug!(cart_id = %cart.id, %book_id, quantity, "cart line item upserted");
        Ok(CartWithItems { cart, items })
    }

    /// Removes one line item (when `item_id` is given) or every line item
    /// (when it is `None`), then recomputes the totals from whatever
    /// remains.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn remove_line_item(
        &self,
        actor: &Actor,
        item_id: Option<CartItemId>,
    ) -> Result<CartWithItems, DomainError> {
        let (mut tx, mut cart) = open_active_cart(self.store.as_ref(), actor.id).await?;
        if !policy::owns_cart(actor, &cart) {
            return Err(DomainError::CartPermissionDenied);
        }

        match item_id {
            Some(item_id) => {
                let item = tx
                    .get_item(item_id)
                    .await?
                    .filter(|item| item.cart_id == cart.id)
                    .ok_or(CartError::ItemNotFound { item_id })?;
                tx.delete_item(item.id).await?;
            }
            None => {
                tx.clear_items(cart.id).await?;
            }
        }

        let items = tx.items_for_cart(cart.id).await?;
        recompute_totals(&mut cart, &items)?;
        tx.save_cart(&cart).await?;
        tx.commit().await?;

        Ok(CartWithItems { cart, items })
    }

    /// Deletes the actor's active cart and all its items.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn delete_cart(&self, actor: &Actor) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;

        let cart = tx
            .find_active_cart(actor.id)
            .await?
            .ok_or(CartError::NoActiveCart)?;
        if !policy::owns_cart(actor, &cart) {
            return Err(DomainError::CartPermissionDenied);
        }

        tx.delete_cart(cart.id).await?;
        tx.commit().await?;

        tracing::debug!(cart_id = %cart.id, "cart deleted");
        Ok(())
    }
}
