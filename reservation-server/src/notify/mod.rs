//! Notification dispatch
//!
//! Admission enqueues a snapshot and returns; a single worker drains the
//! queue and fans out to email and, when the phone has a bound identity, a
//! LINE push. Failures are logged and never reach the reservation.

pub mod email;
pub mod line;

use std::sync::Arc;

use shared::models::ReservationSnapshot;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::store::{IdentityDirectory, StoreError};

pub use email::{EmailSender, LogEmailSender, SesEmailSender};
pub use line::{LineMessagingClient, LinePusher};

/// Queue depth between admission and the worker
pub const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email send failed: {0}")]
    Email(String),

    #[error("LINE push failed: {0}")]
    Line(#[from] reqwest::Error),

    #[error("identity lookup failed: {0}")]
    Directory(#[from] StoreError),
}

/// Enqueue side, cloned into the admission controller
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<ReservationSnapshot>,
}

impl NotificationDispatcher {
    /// Enqueue without waiting; returns `false` when the job was dropped
    pub fn enqueue(&self, snapshot: ReservationSnapshot) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(s)) => {
                tracing::warn!(phone = %s.phone, date = %s.date, time = %s.time, "Notification queue full, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(s)) => {
                tracing::warn!(phone = %s.phone, date = %s.date, time = %s.time, "Notification worker stopped, dropping");
                false
            }
        }
    }
}

/// Create a dispatcher and the receiving end for [`NotificationWorker`]
pub fn channel(capacity: usize) -> (NotificationDispatcher, mpsc::Receiver<ReservationSnapshot>) {
    let (tx, rx) = mpsc::channel(capacity);
    (NotificationDispatcher { tx }, rx)
}

/// Drains the queue and delivers notifications
pub struct NotificationWorker {
    rx: mpsc::Receiver<ReservationSnapshot>,
    email: Arc<dyn EmailSender>,
    line: Option<Arc<dyn LinePusher>>,
    identities: Arc<dyn IdentityDirectory>,
}

impl NotificationWorker {
    pub fn new(
        rx: mpsc::Receiver<ReservationSnapshot>,
        email: Arc<dyn EmailSender>,
        line: Option<Arc<dyn LinePusher>>,
        identities: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self {
            rx,
            email,
            line,
            identities,
        }
    }

    /// Run until shutdown or until every dispatcher is dropped
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            email = self.email.name(),
            line = self.line.is_some(),
            "Notification worker started"
        );
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Notification worker stopping");
                    break;
                }
                job = self.rx.recv() => match job {
                    Some(snapshot) => self.deliver(&snapshot).await,
                    None => break,
                },
            }
        }
    }

    async fn deliver(&self, snapshot: &ReservationSnapshot) {
        if let Err(e) = self.email.send_receipt(snapshot).await {
            tracing::warn!(to = %snapshot.email, error = %e, "Receipt email failed");
        }

        let Some(pusher) = &self.line else {
            return;
        };
        match self.push_line(pusher.as_ref(), snapshot).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(phone = %snapshot.phone, "No LINE identity bound, skipping push");
            }
            Err(e) => {
                tracing::warn!(phone = %snapshot.phone, error = %e, "LINE notification failed");
            }
        }
    }

    /// Returns `false` when the phone has no bound recipient
    async fn push_line(
        &self,
        pusher: &dyn LinePusher,
        snapshot: &ReservationSnapshot,
    ) -> Result<bool, NotifyError> {
        let Some(identity) = self.identities.find_by_phone(&snapshot.phone).await? else {
            return Ok(false);
        };
        pusher
            .push(&identity.line_user_id, &line::render_push(snapshot))
            .await?;
        Ok(true)
    }
}
