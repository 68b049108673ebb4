//! Reservation Server - table reservation admission service
//!
//! # Overview
//!
//! Guests submit a reservation for a date and time. The submission is
//! validated, mapped to a time slot, checked against the ledger for
//! duplicates and admitted against the slot's capacity in one atomic store
//! operation. An admitted reservation is recorded, a short-lived handoff token
//! is minted for the success page, and receipts go out on a background queue.
//!
//! # Module layout
//!
//! ```text
//! reservation-server/src/
//! ├── core/        # config, state, background tasks, server
//! ├── api/         # HTTP routes and handlers
//! ├── auth/        # admin JWT, password hashing, rate limiting
//! ├── admission/   # submission validation and admission control
//! ├── slots/       # slot table and capacity policy
//! ├── store/       # redb / PostgreSQL / Redis backends
//! ├── notify/      # email and LINE notifications
//! ├── handoff.rs   # post-booking tokens
//! ├── identity.rs  # LINE identity binding
//! └── utils/       # logging, time, validation helpers
//! ```

pub mod admission;
pub mod api;
pub mod auth;
pub mod core;
pub mod handoff;
pub mod identity;
pub mod notify;
pub mod slots;
pub mod store;
pub mod utils;

pub use admission::{AdmissionController, AdmissionError, Admitted};
pub use crate::core::{AppState, Config, Server};
pub use handoff::{HandoffError, TokenHandoff};
pub use slots::{CapacityPolicy, SlotTable};
pub use store::Stores;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};
