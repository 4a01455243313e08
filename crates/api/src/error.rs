//! API error types with HTTP response mapping.
//!
//! Every expected domain outcome is converted to the `{error, detail}`
//! envelope here and nowhere else; store and invariant failures are logged
//! and reported as opaque 500s.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, CatalogError, DomainError};
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid credentials.
    Unauthenticated(String),
    /// Malformed request (bad JSON body, invalid path parameter).
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self {
            ApiError::Unauthenticated(detail) => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided or are invalid.".to_string(),
                Some(detail),
            ),
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "Invalid request.".to_string(),
                Some(detail),
            ),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.".to_string(),
                    None,
                )
            }
        };

        (status, axum::Json(ErrorBody { error, detail })).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String, Option<String>) {
    let detail = Some(err.to_string());
    match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::InvalidQuantity | CartError::TotalsOutOfRange => {
                (StatusCode::BAD_REQUEST, "Validation failed.".into(), detail)
            }
            CartError::BookNotFound { .. } => {
                (StatusCode::NOT_FOUND, "Book not found.".into(), detail)
            }
            CartError::ItemNotFound { .. } => {
                (StatusCode::NOT_FOUND, "Cart item not found.".into(), detail)
            }
            CartError::NoActiveCart => (StatusCode::NOT_FOUND, err.to_string(), None),
            CartError::AlreadyOrdered
            | CartError::Empty
            | CartError::InsufficientStock { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string(), None)
            }
        },
        DomainError::Catalog(catalog_err) => match catalog_err {
            CatalogError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "Book not found.".into(), detail)
            }
            CatalogError::PermissionDenied => {
                (StatusCode::FORBIDDEN, "Permission denied.".into(), detail)
            }
            CatalogError::DuplicateName { .. } | CatalogError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "Validation failed.".into(), detail)
            }
        },
        DomainError::CartPermissionDenied => {
            (StatusCode::FORBIDDEN, "Permission denied.".into(), detail)
        }
        DomainError::Store(_) | DomainError::Invariant(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred.".into(),
                None,
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
