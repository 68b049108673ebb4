//! Messaging identity binding
//!
//! After booking, the guest can link a LINE account so later notifications
//! reach them there. The handoff token proves they just made the reservation;
//! it is claimed (deleted) by the bind.

use std::sync::Arc;
use std::time::Duration;

use shared::error::{AppError, ErrorCode};
use shared::models::{BindIdentityRequest, LineIdentity};
use thiserror::Error;

use crate::handoff::{HandoffError, TokenHandoff};
use crate::store::{IdentityDirectory, ReservationLedger, StoreError};
use crate::utils::validation::{FieldError, MAX_SHORT_TEXT_LEN, validate_required_text};

/// How old a reservation may be when its identity is bound
pub const CLAIM_WINDOW: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error("handoff token is unknown or expired")]
    TokenInvalid,

    #[error("reservation for {phone} at {date} {time} not found")]
    ReservationMissing {
        phone: String,
        date: String,
        time: String,
    },

    #[error("reservation is {age_secs}s old, past the claim window")]
    WindowExpired { age_secs: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<HandoffError> for BindError {
    fn from(err: HandoffError) -> Self {
        match err {
            HandoffError::NotFound => BindError::TokenInvalid,
            HandoffError::Store(e) => BindError::Store(e),
        }
    }
}

impl From<BindError> for AppError {
    fn from(err: BindError) -> Self {
        match err {
            BindError::Invalid(e) => e.into(),
            BindError::TokenInvalid => AppError::new(ErrorCode::HandoffTokenInvalid),
            BindError::ReservationMissing { .. } => AppError::new(ErrorCode::ReservationNotFound),
            BindError::WindowExpired { .. } => AppError::new(ErrorCode::ClaimWindowExpired),
            BindError::Store(_) => AppError::store_unavailable(),
        }
    }
}

#[derive(Clone)]
pub struct IdentityBinder {
    handoff: TokenHandoff,
    ledger: Arc<dyn ReservationLedger>,
    identities: Arc<dyn IdentityDirectory>,
    claim_window: Duration,
}

impl IdentityBinder {
    pub fn new(
        handoff: TokenHandoff,
        ledger: Arc<dyn ReservationLedger>,
        identities: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self {
            handoff,
            ledger,
            identities,
            claim_window: CLAIM_WINDOW,
        }
    }

    pub fn with_claim_window(mut self, window: Duration) -> Self {
        self.claim_window = window;
        self
    }

    /// Bind `req.line_user_id` to the phone of the reservation behind `req.token`
    pub async fn bind(&self, req: &BindIdentityRequest) -> Result<LineIdentity, BindError> {
        validate_required_text(&req.line_user_id, "line_user_id", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&req.line_name, "line_name", MAX_SHORT_TEXT_LEN)?;

        let snapshot = self.handoff.claim(req.token.trim()).await?;

        let record = self
            .ledger
            .find_by_identity(&snapshot.phone, &snapshot.date, &snapshot.time)
            .await?
            .ok_or_else(|| BindError::ReservationMissing {
                phone: snapshot.phone.clone(),
                date: snapshot.date.clone(),
                time: snapshot.time.clone(),
            })?;

        let now = shared::util::now_millis();
        let age_ms = now - record.created_at;
        if age_ms > self.claim_window.as_millis() as i64 {
            tracing::info!(phone = %record.phone, age_ms, "Identity bind refused: claim window passed");
            return Err(BindError::WindowExpired {
                age_secs: age_ms / 1000,
            });
        }

        let identity = LineIdentity {
            line_user_id: req.line_user_id.trim().to_string(),
            line_name: req.line_name.trim().to_string(),
            phone: record.phone,
            created_at: now,
        };
        self.identities.upsert_identity(&identity).await?;

        tracing::info!(phone = %identity.phone, line_user_id = %identity.line_user_id, "LINE identity bound");
        Ok(identity)
    }
}
