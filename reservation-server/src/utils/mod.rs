//! Utility modules
//!
//! - [`logger`] - tracing subscriber setup
//! - [`time`] - restaurant-local date and time parsing
//! - [`validation`] - field limits and patterns

pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
