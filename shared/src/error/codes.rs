//! Unified error codes for the reservation service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Slot / capacity errors
//! - 4xxx: Reservation errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values on the wire so the booking
/// form and the backstage can switch on them without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Too many requests from the same client
    TooManyRequests = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Slot ====================
    /// The selected time does not map to any slot
    InvalidTimeSlot = 3001,
    /// The slot has no remaining capacity
    SlotFull = 3002,

    // ==================== 4xxx: Reservation ====================
    /// A reservation for the same phone, date and time already exists
    DuplicateBooking = 4001,
    /// Reservation not found
    ReservationNotFound = 4002,
    /// Handoff token is unknown or expired
    HandoffTokenInvalid = 4003,
    /// Reservation is too old to be claimed
    ClaimWindowExpired = 4004,
    /// Phone number is not accepted
    PhoneBlocked = 4005,
    /// Reservation date is before today
    DateInPast = 4006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Timeout error
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// A backing store is unreachable
    StoreUnavailable = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Slot
            ErrorCode::InvalidTimeSlot => "The selected time is not bookable",
            ErrorCode::SlotFull => "This time slot is full, please pick another time",

            // Reservation
            ErrorCode::DuplicateBooking => "You already hold a reservation for this time",
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::HandoffTokenInvalid => "Invalid or expired token",
            ErrorCode::ClaimWindowExpired => "Reservation can no longer be linked",
            ErrorCode::PhoneBlocked => "This phone number cannot be used for reservations",
            ErrorCode::DateInPast => "Date cannot be before today",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StoreUnavailable => "Service temporarily unavailable, try again later",
        }
    }

    /// Stable failure reason reported to the booking form
    ///
    /// The form only distinguishes a handful of outcomes; every code folds
    /// into one of them.
    pub const fn reason(&self) -> &'static str {
        match self {
            ErrorCode::InvalidTimeSlot => "invalid_slot",
            ErrorCode::SlotFull => "slot_full",
            ErrorCode::DuplicateBooking => "duplicate_booking",
            ErrorCode::HandoffTokenInvalid => "invalid_token",
            ErrorCode::Success => "ok",
            ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::NetworkError
            | ErrorCode::TimeoutError
            | ErrorCode::ConfigError
            | ErrorCode::StoreUnavailable
            | ErrorCode::Unknown => "server_error",
            _ => "invalid_format",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::TooManyRequests),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Slot
            3001 => Ok(ErrorCode::InvalidTimeSlot),
            3002 => Ok(ErrorCode::SlotFull),

            // Reservation
            4001 => Ok(ErrorCode::DuplicateBooking),
            4002 => Ok(ErrorCode::ReservationNotFound),
            4003 => Ok(ErrorCode::HandoffTokenInvalid),
            4004 => Ok(ErrorCode::ClaimWindowExpired),
            4005 => Ok(ErrorCode::PhoneBlocked),
            4006 => Ok(ErrorCode::DateInPast),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::StoreUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::TooManyRequests.code(), 1005);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::InvalidTimeSlot.code(), 3001);
        assert_eq!(ErrorCode::SlotFull.code(), 3002);
        assert_eq!(ErrorCode::DuplicateBooking.code(), 4001);
        assert_eq!(ErrorCode::HandoffTokenInvalid.code(), 4003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::StoreUnavailable.code(), 9006);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::SlotFull.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(3002), Ok(ErrorCode::SlotFull));
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::DuplicateBooking));
        assert_eq!(ErrorCode::try_from(9006), Ok(ErrorCode::StoreUnavailable));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(3999), Err(InvalidErrorCode(3999)));
        assert_eq!(ErrorCode::try_from(5001), Err(InvalidErrorCode(5001)));
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidFormat,
            ErrorCode::ValueOutOfRange,
            ErrorCode::NotAuthenticated,
            ErrorCode::InvalidCredentials,
            ErrorCode::TokenExpired,
            ErrorCode::TokenInvalid,
            ErrorCode::TooManyRequests,
            ErrorCode::PermissionDenied,
            ErrorCode::InvalidTimeSlot,
            ErrorCode::SlotFull,
            ErrorCode::DuplicateBooking,
            ErrorCode::ReservationNotFound,
            ErrorCode::HandoffTokenInvalid,
            ErrorCode::ClaimWindowExpired,
            ErrorCode::PhoneBlocked,
            ErrorCode::DateInPast,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::NetworkError,
            ErrorCode::TimeoutError,
            ErrorCode::ConfigError,
            ErrorCode::StoreUnavailable,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(serde_json::to_string(&ErrorCode::SlotFull).unwrap(), "3002");
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::DuplicateBooking);

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::SlotFull), "3002");
    }

    #[test]
    fn test_reason() {
        assert_eq!(ErrorCode::InvalidTimeSlot.reason(), "invalid_slot");
        assert_eq!(ErrorCode::SlotFull.reason(), "slot_full");
        assert_eq!(ErrorCode::DuplicateBooking.reason(), "duplicate_booking");
        assert_eq!(ErrorCode::HandoffTokenInvalid.reason(), "invalid_token");
        assert_eq!(ErrorCode::StoreUnavailable.reason(), "server_error");
        assert_eq!(ErrorCode::InternalError.reason(), "server_error");
        assert_eq!(ErrorCode::ValidationFailed.reason(), "invalid_format");
        assert_eq!(ErrorCode::PhoneBlocked.reason(), "invalid_format");
        assert_eq!(ErrorCode::DateInPast.reason(), "invalid_format");
        assert_eq!(ErrorCode::PhoneBlocked.http_status().as_u16(), 400);
    }

    #[test]
    fn test_invalid_error_code_display() {
        let err = InvalidErrorCode(999);
        assert_eq!(format!("{}", err), "invalid error code: 999");
    }
}
