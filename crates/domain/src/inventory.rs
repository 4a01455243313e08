//! Inventory ledger: guards `Book.stock` against going negative.
//!
//! Checkout consults [`check_available`] for every line item before any
//! stock is written; [`decrement`] therefore treats an underflow as an
//! invariant breach (a concurrency-control defect), not a user error.

use store::{Book, BookRepository, StoreTx};

use crate::error::DomainError;

/// Returns true if the book can cover the requested quantity.
pub fn check_available(book: &Book, quantity: u32) -> bool {
    book.stock >= quantity
}

/// Decrements a book's stock by the given quantity and persists it.
///
/// Must only be called after [`check_available`] passed inside the same
/// transaction with the book row locked.
pub async fn decrement(
    tx: &mut dyn StoreTx,
    book: &Book,
    quantity: u32,
) -> Result<(), DomainError> {
    let Some(new_stock) = book.stock.checked_sub(quantity) else {
        tracing::error!(
            book_id = %book.id,
            stock = book.stock,
            quantity,
            "stock decrement would underflow despite a passing precondition"
        );
        return Err(DomainError::Invariant(format!(
            "stock underflow for book {}",
            book.id
        )));
    };

    tx.save_book_stock(book.id, new_stock).await?;
    Ok(())
}
