//! Catalog endpoints. Reads are open to any authenticated user; writes
//! require a superuser.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BookId, Money};
use domain::{BookDraft, BookPatch};
use serde::{Deserialize, Serialize};
use store::Book;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::Envelope;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateBookRequest {
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in cents.
    pub price: i64,
    pub stock: i64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateBookRequest {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookResponse {
    pub id: String,
    pub name: String,
    pub author: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: u32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.to_string(),
            name: book.name,
            author: book.author,
            description: book.description,
            price: book.price.cents(),
            stock: book.stock,
        }
    }
}

fn parse_stock(stock: i64) -> Result<u32, ApiError> {
    u32::try_from(stock)
        .map_err(|_| ApiError::BadRequest("Stock must be a non-negative integer.".to_string()))
}

// -- Handlers --

/// GET /books — list the catalog.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Envelope<Vec<BookResponse>>>, ApiError> {
    let books = state.catalog.list_books().await?;
    let data = books.into_iter().map(BookResponse::from).collect();
    Ok(Json(Envelope::new("Books retrieved successfully.", data)))
}

/// GET /books/{id} — one book.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Envelope<BookResponse>>, ApiError> {
    let book = state.catalog.get_book(BookId::from_uuid(id)).await?;
    Ok(Json(Envelope::new(
        "Book retrieved successfully.",
        book.into(),
    )))
}

/// POST /books — add a book to the catalog.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<BookResponse>>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let draft = BookDraft {
        name: req.name,
        author: req.author,
        description: req.description,
        price: Money::from_cents(req.price),
        stock: parse_stock(req.stock)?,
    };
    let book = state.catalog.create_book(&user.actor(), draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new("Book created successfully.", book.into())),
    ))
}

/// PUT /books/{id} — partially update a book; absent fields are unchanged.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<Envelope<BookResponse>>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let patch = BookPatch {
        name: req.name,
        author: req.author,
        description: req.description.map(Some),
        price: req.price.map(Money::from_cents),
        stock: req.stock.map(parse_stock).transpose()?,
    };
    let book = state
        .catalog
        .update_book(&user.actor(), BookId::from_uuid(id), patch)
        .await?;

    Ok(Json(Envelope::new(
        "Book updated successfully.",
        book.into(),
    )))
}

/// DELETE /books/{id} — remove a book from the catalog.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .catalog
        .delete_book(&user.actor(), BookId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
