//! HTTP API server for the bookshop backend.
//!
//! Exposes the catalog and cart lifecycle over REST, with bearer-token
//! authentication, structured logging (tracing), and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch};
use domain::{CartService, CatalogService, Checkout};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::TokenVerifier;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub checkout: Checkout,
    pub tokens: Arc<dyn TokenVerifier>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/books", get(routes::books::list).post(routes::books::create))
        .route(
            "/books/{id}",
            get(routes::books::get)
                .put(routes::books::update)
                .delete(routes::books::remove),
        )
        .route(
            "/carts",
            get(routes::carts::show)
                .post(routes::carts::add_item)
                .delete(routes::carts::clear),
        )
        .route("/carts/order_cart", patch(routes::carts::order))
        .route("/carts/delete_cart", delete(routes::carts::delete))
        .route("/carts/{item_id}", delete(routes::carts::remove_item))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given store and verifier.
pub fn create_default_state(
    store: Arc<dyn Store>,
    tokens: Arc<dyn TokenVerifier>,
) -> Arc<AppState> {
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        carts: CartService::new(store.clone()),
        checkout: Checkout::new(store),
        tokens,
    })
}
