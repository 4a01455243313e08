//! Persistence layer for the bookshop backend.
//!
//! Exposes the repository traits consumed by the domain layer together with
//! two interchangeable backends: [`MemoryStore`] for tests and standalone
//! operation, and [`PostgresStore`] for production.

mod error;
mod memory;
mod postgres;
mod records;
mod repository;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use records::{Book, Cart, CartItem};
pub use repository::{BookRepository, CartRepository, Store, StoreTx};
