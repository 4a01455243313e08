use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated. Carries the constraint name so the
    /// caller can distinguish, e.g., a duplicate book name from a racing
    /// active-cart insert.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A stored row holds a value outside its domain range (e.g. a negative
    /// quantity). Indicates external tampering or a schema drift.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
