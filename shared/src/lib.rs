//! Shared types for the reservation service
//!
//! Error codes, API response envelope and the reservation / slot / settings
//! models exchanged between the server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
