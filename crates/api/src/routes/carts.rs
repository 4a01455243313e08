//! Cart endpoints: view, line-item mutation, clearing, checkout, deletion.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BookId, CartItemId};
use domain::CartWithItems;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::Envelope;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub book_id: uuid::Uuid,
    /// Signed on the wire so that zero and negative quantities reach the
    /// domain validation instead of failing JSON deserialization.
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub total_price: i64,
    pub total_quantity: u32,
    pub is_ordered: bool,
    pub items: Vec<CartItemResponse>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub book_id: String,
    pub quantity: u32,
    pub price: i64,
}

impl From<CartWithItems> for CartResponse {
    fn from(view: CartWithItems) -> Self {
        Self {
            id: view.cart.id.to_string(),
            user_id: view.cart.user_id.to_string(),
            total_price: view.cart.total_price.cents(),
            total_quantity: view.cart.total_quantity,
            is_ordered: view.cart.is_ordered,
            items: view
                .items
                .into_iter()
                .map(|item| CartItemResponse {
                    id: item.id.to_string(),
                    book_id: item.book_id.to_string(),
                    quantity: item.quantity,
                    price: item.price.cents(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// GET /carts — the caller's active cart, created on first access.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Envelope<CartResponse>>, ApiError> {
    let view = state.carts.active_cart(&user.actor()).await?;
    Ok(Json(Envelope::new(
        "Cart retrieved successfully.",
        view.into(),
    )))
}

/// POST /carts — add a book to the cart or overwrite its quantity.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<CartResponse>>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let view = state
        .carts
        .upsert_line_item(&user.actor(), BookId::from_uuid(req.book_id), req.quantity)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new("Cart updated successfully.", view.into())),
    ))
}

/// DELETE /carts/{item_id} — remove a single line item.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<uuid::Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .carts
        .remove_line_item(&user.actor(), Some(CartItemId::from_uuid(item_id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /carts — remove every line item from the cart.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.carts.remove_line_item(&user.actor(), None).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /carts/order_cart — place the order for the active cart.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Envelope<CartResponse>>, ApiError> {
    let view = state.checkout.order_cart(&user.actor()).await?;
    Ok(Json(Envelope::new(
        "Cart has been successfully ordered.",
        view.into(),
    )))
}

/// DELETE /carts/delete_cart — delete the active cart and its items.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.carts.delete_cart(&user.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}
