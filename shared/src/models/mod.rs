//! Data models
//!
//! Shared between the reservation server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod identity;
pub mod reservation;
pub mod settings;
pub mod slot;

// Re-exports
pub use identity::*;
pub use reservation::*;
pub use settings::*;
pub use slot::*;
