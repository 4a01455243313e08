//! API server entry point.

use std::sync::Arc;

use api::auth::{AuthUser, InMemoryTokenVerifier};
use api::config::Config;
use common::UserId;
use store::{MemoryStore, PostgresStore, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the token verifier from `SUPERUSER_TOKEN` / `USER_TOKEN`.
fn token_verifier() -> Arc<InMemoryTokenVerifier> {
    let verifier = InMemoryTokenVerifier::new();

    if let Ok(token) = std::env::var("SUPERUSER_TOKEN") {
        verifier.grant(
            &token,
            AuthUser {
                id: UserId::new(),
                email: "admin@example.com".to_string(),
                is_superuser: true,
            },
        );
        tracing::info!("registered superuser token from SUPERUSER_TOKEN");
    }
    if let Ok(token) = std::env::var("USER_TOKEN") {
        verifier.grant(
            &token,
            AuthUser {
                id: UserId::new(),
                email: "user@example.com".to_string(),
                is_superuser: false,
            },
        );
        tracing::info!("registered user token from USER_TOKEN");
    }

    Arc::new(verifier)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Open the store: Postgres when DATABASE_URL is set, in-memory otherwise
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("connected to PostgreSQL store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // 4. Build application state and router
    let state = api::create_default_state(store, token_verifier());
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
