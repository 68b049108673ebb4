//! Admission control
//!
//! One submission walks `RECEIVED → SLOT_RESOLVED → ADMITTED` or stops at
//! one of the rejections. The only shared state touched is the (date, slot)
//! counter and the (phone, date, time) ledger key; both are guarded by the
//! store, so no lock is held here.

pub mod validation;

use std::collections::HashSet;
use std::sync::Arc;

use chrono_tz::Tz;
use shared::error::{AppError, ErrorCode};
use shared::models::{ReservationRecord, ReservationRequest};
use thiserror::Error;

use crate::handoff::{HandoffError, TokenHandoff};
use crate::notify::NotificationDispatcher;
use crate::slots::CapacityPolicy;
use crate::store::{
    InsertError, ReservationLedger, SettingsStore, SlotCounter, StoreError, Stores,
};
use crate::utils::time::{format_date, format_time, today_in};
use crate::utils::validation::FieldError;

pub use validation::{ValidatedRequest, validate_request};

/// Ledger inserts tried before a record id collision is given up on
const INSERT_ATTEMPTS: u32 = 3;

/// Why a submission was not admitted
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error("{time} on {date} is not a bookable time")]
    InvalidSlot { date: String, time: String },

    #[error("{phone} already holds a reservation at {date} {time}")]
    Duplicate {
        phone: String,
        date: String,
        time: String,
    },

    #[error("slot {slot_id} on {date} is full")]
    Full { date: String, slot_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Seat taken but the ledger write failed
    #[error("seat admitted on {date}/{slot_id} but reservation was not recorded: {source}")]
    Unrecorded {
        date: String,
        slot_id: String,
        #[source]
        source: StoreError,
    },
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::Invalid(e) => e.into(),
            AdmissionError::InvalidSlot { date, time } => AppError::with_message(
                ErrorCode::InvalidTimeSlot,
                format!("{time} on {date} is not a bookable time"),
            )
            .with_detail("field", "time"),
            AdmissionError::Duplicate { date, time, .. } => {
                AppError::new(ErrorCode::DuplicateBooking)
                    .with_detail("date", date)
                    .with_detail("time", time)
            }
            AdmissionError::Full { date, slot_id } => AppError::new(ErrorCode::SlotFull)
                .with_detail("date", date)
                .with_detail("slot_id", slot_id),
            AdmissionError::Store(_) => AppError::store_unavailable(),
            AdmissionError::Unrecorded { .. } => {
                AppError::internal("Reservation could not be recorded, please contact the restaurant")
            }
        }
    }
}

/// Successful admission
#[derive(Debug, Clone)]
pub struct Admitted {
    pub token: String,
    pub record: ReservationRecord,
}

/// Drives a submission through validation, slot admission and recording
#[derive(Clone)]
pub struct AdmissionController {
    policy: Arc<CapacityPolicy>,
    slots: Arc<dyn SlotCounter>,
    ledger: Arc<dyn ReservationLedger>,
    settings: Arc<dyn SettingsStore>,
    handoff: TokenHandoff,
    notifier: NotificationDispatcher,
    deny_list: Arc<HashSet<String>>,
    timezone: Tz,
}

impl AdmissionController {
    pub fn new(
        policy: Arc<CapacityPolicy>,
        stores: &Stores,
        handoff: TokenHandoff,
        notifier: NotificationDispatcher,
        timezone: Tz,
    ) -> Self {
        Self {
            policy,
            slots: stores.slots.clone(),
            ledger: stores.ledger.clone(),
            settings: stores.settings.clone(),
            handoff,
            notifier,
            deny_list: Arc::new(HashSet::new()),
            timezone,
        }
    }

    /// Phones refused at validation
    pub fn with_deny_list(mut self, deny_list: HashSet<String>) -> Self {
        self.deny_list = Arc::new(deny_list);
        self
    }

    pub async fn submit(&self, req: &ReservationRequest) -> Result<Admitted, AdmissionError> {
        let today = today_in(self.timezone);
        let v = validate_request(req, today, &self.deny_list).inspect_err(|e| {
            tracing::debug!(field = e.field, error = %e, "Submission rejected: invalid");
        })?;
        let date = format_date(v.date);
        let time = format_time(v.time);
        tracing::debug!(phone = %v.phone, date = %date, time = %time, "Submission received");

        let slot = self.policy.resolve_slot(v.date, v.time).map_err(|e| {
            tracing::debug!(error = %e, "Submission rejected: invalid slot");
            AdmissionError::InvalidSlot {
                date: date.clone(),
                time: time.clone(),
            }
        })?;
        tracing::debug!(
            date = %date,
            slot_id = %slot.slot_id,
            class = %slot.class,
            "Slot resolved"
        );

        if self
            .ledger
            .find_by_identity(&v.phone, &date, &time)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Ledger lookup failed"))?
            .is_some()
        {
            tracing::info!(phone = %v.phone, date = %date, time = %time, "Submission rejected: duplicate");
            return Err(AdmissionError::Duplicate {
                phone: v.phone,
                date,
                time,
            });
        }

        let capacity = self
            .settings
            .load_settings()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Settings read failed"))?
            .capacity_for(slot.class);

        let admitted = self
            .slots
            .try_admit(&date, &slot.slot_id, capacity)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Slot admission failed"))?;
        if !admitted {
            tracing::info!(date = %date, slot_id = %slot.slot_id, capacity, "Submission rejected: slot full");
            return Err(AdmissionError::Full {
                date,
                slot_id: slot.slot_id,
            });
        }

        let mut record = ReservationRecord {
            id: shared::util::snowflake_id(),
            name: v.name,
            phone: v.phone,
            email: v.email,
            date,
            time,
            adults: v.adults,
            children: v.children,
            high_chairs: v.high_chairs,
            dietary: v.dietary,
            special_needs: v.special_needs,
            notes: v.notes,
            slot_id: slot.slot_id,
            capacity_class: slot.class,
            created_at: shared::util::now_millis(),
        };

        let mut attempt = 1;
        let inserted = loop {
            match self.ledger.insert(&record).await {
                Err(InsertError::IdTaken(id)) if attempt < INSERT_ATTEMPTS => {
                    tracing::warn!(
                        id,
                        attempt,
                        "Reservation id collision, retrying with a fresh id"
                    );
                    record.id = shared::util::snowflake_id();
                    attempt += 1;
                }
                other => break other,
            }
        };

        match inserted {
            Ok(()) => {}
            Err(InsertError::Duplicate) => {
                tracing::info!(
                    phone = %record.phone,
                    date = %record.date,
                    time = %record.time,
                    "Submission rejected: duplicate (concurrent insert)"
                );
                return Err(AdmissionError::Duplicate {
                    phone: record.phone,
                    date: record.date,
                    time: record.time,
                });
            }
            Err(InsertError::IdTaken(id)) => {
                return Err(unrecorded(record, StoreError::IdConflict(id)));
            }
            Err(InsertError::Store(source)) => return Err(unrecorded(record, source)),
        }

        let snapshot = record.snapshot();
        let token = match self.handoff.issue(&snapshot).await {
            Ok(token) => token,
            Err(HandoffError::Store(e)) => {
                tracing::warn!(id = record.id, error = %e, "Handoff token could not be issued");
                return Err(e.into());
            }
            Err(HandoffError::NotFound) => {
                return Err(StoreError::Corrupt("token store rejected a fresh token".into()).into());
            }
        };

        self.notifier.enqueue(snapshot);

        tracing::info!(
            id = record.id,
            date = %record.date,
            time = %record.time,
            slot_id = %record.slot_id,
            party = record.party_size(),
            "Reservation admitted"
        );
        Ok(Admitted { token, record })
    }
}

/// A seat was taken but the ledger write failed; the counter is not rolled back
fn unrecorded(record: ReservationRecord, source: StoreError) -> AdmissionError {
    tracing::error!(
        target: "capacity_reconcile",
        date = %record.date,
        slot_id = %record.slot_id,
        phone = %record.phone,
        error = %source,
        "Seat admitted but reservation not recorded"
    );
    AdmissionError::Unrecorded {
        date: record.date,
        slot_id: record.slot_id,
        source,
    }
}
