//! Post-booking token handoff
//!
//! A successful admission mints a random opaque token bound to a snapshot of
//! the reservation. The success page resolves it (repeatedly, within the TTL);
//! identity binding claims it once.

use std::sync::Arc;
use std::time::Duration;

use shared::models::ReservationSnapshot;
use thiserror::Error;

use crate::store::{StoreError, TokenStore};

/// Random bytes per token (hex-encoded to twice as many characters)
pub const TOKEN_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum HandoffError {
    /// Never issued, expired, or already claimed
    #[error("handoff token not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TokenHandoff {
    store: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl TokenHandoff {
    pub fn new(store: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Store `snapshot` under a fresh token
    pub async fn issue(&self, snapshot: &ReservationSnapshot) -> Result<String, HandoffError> {
        let token = shared::util::random_hex_token(TOKEN_BYTES);
        let value = serde_json::to_string(snapshot).map_err(StoreError::from)?;
        self.store.put(&token, &value, self.ttl).await?;
        Ok(token)
    }

    /// Snapshot for `token`; the token stays valid until it expires
    pub async fn resolve(&self, token: &str) -> Result<ReservationSnapshot, HandoffError> {
        if !is_well_formed(token) {
            return Err(HandoffError::NotFound);
        }
        let value = self.store.get(token).await?.ok_or(HandoffError::NotFound)?;
        Ok(serde_json::from_str(&value).map_err(StoreError::from)?)
    }

    /// Snapshot for `token`, deleting it in the same store operation
    pub async fn claim(&self, token: &str) -> Result<ReservationSnapshot, HandoffError> {
        if !is_well_formed(token) {
            return Err(HandoffError::NotFound);
        }
        let value = self
            .store
            .take(token)
            .await?
            .ok_or(HandoffError::NotFound)?;
        Ok(serde_json::from_str(&value).map_err(StoreError::from)?)
    }

    /// Drop expired tokens (in-process backend only)
    pub async fn sweep(&self) -> usize {
        self.store.sweep().await
    }
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}
