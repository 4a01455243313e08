//! Bearer-token authentication for API handlers.
//!
//! Handlers take an [`AuthUser`] argument; the extractor resolves the
//! `Authorization` header through the [`TokenVerifier`] in application state
//! and rejects the request with 401 before the handler body runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;
use domain::Actor;

use crate::AppState;
use crate::error::ApiError;

/// An authenticated caller, as resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub is_superuser: bool,
}

impl AuthUser {
    /// The domain-level view of this user.
    pub fn actor(&self) -> Actor {
        if self.is_superuser {
            Actor::superuser(self.id)
        } else {
            Actor::user(self.id)
        }
    }
}

/// Resolves bearer tokens to users.
///
/// The API does not manage accounts itself; identity is provided by
/// whatever verifier is installed at startup.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<AuthUser>;
}

/// Token verifier backed by an in-process map, for development and tests.
#[derive(Default)]
pub struct InMemoryTokenVerifier {
    tokens: RwLock<HashMap<String, AuthUser>>,
}

impl InMemoryTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as a credential for `user`.
    pub fn grant(&self, token: &str, user: AuthUser) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.to_string(), user);
        }
    }
}

#[async_trait]
impl TokenVerifier for InMemoryTokenVerifier {
    async fn verify(&self, token: &str) -> Option<AuthUser> {
        self.tokens
            .read()
            .ok()
            .and_then(|tokens| tokens.get(token).cloned())
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError::Unauthenticated("Missing or malformed Authorization header.".to_string())
        })?;

        state
            .tokens
            .verify(token)
            .await
            .ok_or_else(|| ApiError::Unauthenticated("Unknown token.".to_string()))
    }
}
