//! Reservation Model

use super::slot::CapacityClass;
use serde::{Deserialize, Serialize};

/// Stored in place of a blank optional text field
pub const NONE_SENTINEL: &str = "none";

/// Reservation submission payload (booking form)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    /// `YYYY-MM-DD`, restaurant local calendar
    pub date: String,
    /// `HH:MM`, restaurant local wall clock
    pub time: String,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    #[serde(default)]
    pub high_chairs: i32,
    #[serde(default)]
    pub dietary: Option<String>,
    #[serde(default)]
    pub special_needs: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Confirmed reservation (ledger entry)
///
/// Identity is `(phone, date, time)`. Created together with a successful
/// slot admission and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub adults: i32,
    pub children: i32,
    pub high_chairs: i32,
    pub dietary: String,
    pub special_needs: String,
    pub notes: String,
    pub slot_id: String,
    pub capacity_class: CapacityClass,
    pub created_at: i64,
}

impl ReservationRecord {
    pub fn party_size(&self) -> i32 {
        self.adults + self.children
    }

    /// Display snapshot carried by the handoff token
    pub fn snapshot(&self) -> ReservationSnapshot {
        ReservationSnapshot {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            adults: self.adults,
            children: self.children,
            party_size: self.party_size(),
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
    }
}

/// Display fields of a just-confirmed reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub adults: i32,
    pub children: i32,
    pub party_size: i32,
    pub notes: String,
    pub created_at: i64,
}

/// Successful submission response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub token: String,
    pub redirect: String,
}
