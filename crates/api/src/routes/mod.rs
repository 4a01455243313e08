//! HTTP route handlers.

pub mod books;
pub mod carts;
pub mod health;
pub mod metrics;

use serde::Serialize;

/// Success envelope: every 2xx body is `{message, data}`.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data,
        }
    }
}
