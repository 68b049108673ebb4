//! Shared setup for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use reservation_server::store::{EmbeddedStore, MemoryTokenStore};
use reservation_server::{AppState, CapacityPolicy, Config, SlotTable, Stores};
use shared::models::{ReservationRequest, ReservationSnapshot};
use tokio::sync::mpsc;

pub const ADMIN_PASSWORD: &str = "backstage-pass";

/// 2099-01-06 is a Tuesday
pub const TUESDAY: &str = "2099-01-06";
/// 2099-01-04 is a Sunday
pub const SUNDAY: &str = "2099-01-04";

pub fn test_config() -> Config {
    Config {
        admin_password_hash: reservation_server::auth::password::hash_password(ADMIN_PASSWORD)
            .unwrap(),
        jwt_secret: "test-secret".into(),
        ..Config::default()
    }
}

/// State over an in-memory embedded store and in-process tokens
pub fn test_state() -> (AppState, mpsc::Receiver<ReservationSnapshot>) {
    AppState::build(
        test_config(),
        CapacityPolicy::new(SlotTable::builtin()),
        Stores::embedded(EmbeddedStore::open_in_memory().unwrap()),
        Arc::new(MemoryTokenStore::new()),
    )
}

pub fn request(phone: &str, date: &str, time: &str) -> ReservationRequest {
    ReservationRequest {
        name: "Chen".into(),
        phone: phone.into(),
        email: format!("{phone}@example.com"),
        date: date.into(),
        time: time.into(),
        adults: 2,
        children: 0,
        high_chairs: 0,
        dietary: None,
        special_needs: None,
        notes: None,
    }
}

/// Distinct valid phone numbers
pub fn phone(n: usize) -> String {
    format!("09{:08}", n)
}
