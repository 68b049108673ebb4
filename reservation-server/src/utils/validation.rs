//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use std::sync::LazyLock;

use regex::Regex;
use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Guest names
pub const MAX_NAME_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Free-text notes shown on the confirmation (booking form limit)
pub const MAX_NOTES_CHARS: usize = 30;

/// Dietary and special-needs descriptions
pub const MAX_REMARK_LEN: usize = 500;

/// LINE user ids and display names
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Patterns ────────────────────────────────────────────────────────

/// Taiwanese mobile number: `09` followed by eight ASCII digits
///
/// `\d` is Unicode-aware in `regex` and would let full-width digits through.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^09[0-9]{8}$").expect("phone pattern is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: &'static str,
    /// `ValidationFailed` unless a more specific code applies
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::with_message(err.code, err.message).with_detail("field", err.field)
    }
}

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(
    value: &str,
    field: &'static str,
    max_len: usize,
) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(FieldError::new(
            field,
            format!("{field} is too long ({len} chars, max {max_len})"),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &'static str,
    max_len: usize,
) -> Result<(), FieldError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(FieldError::new(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.chars().count()),
        ));
    }
    Ok(())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Trimmed text, or the `"none"` sentinel when blank
pub fn text_or_sentinel(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => shared::models::NONE_SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("0912345678"));
        assert!(!is_valid_phone("091234567"));
        assert!(!is_valid_phone("09123456789"));
        assert!(!is_valid_phone("0812345678"));
        assert!(!is_valid_phone("09-2345678"));
        assert!(!is_valid_phone(""));
        // Full-width and Arabic-Indic digits
        assert!(!is_valid_phone("09１２３４５６７８"));
        assert!(!is_valid_phone("09٠١٢٣٤٥٦٧"));
        assert!(!is_valid_phone("０９12345678"));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("guest@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.tw"));
        assert!(!is_valid_email("guest@example"));
        assert!(!is_valid_email("guest example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Lin", "name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.field, "name");
        assert!(validate_required_text(&"x".repeat(101), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_optional_text_counts_chars() {
        // 30 CJK characters are 90 bytes but still within the notes limit
        let notes = Some("好".repeat(30));
        assert!(validate_optional_text(&notes, "notes", MAX_NOTES_CHARS).is_ok());
        let notes = Some("好".repeat(31));
        assert!(validate_optional_text(&notes, "notes", MAX_NOTES_CHARS).is_err());
        assert!(validate_optional_text(&None, "notes", MAX_NOTES_CHARS).is_ok());
    }

    #[test]
    fn test_sentinel() {
        assert_eq!(text_or_sentinel(&None), "none");
        assert_eq!(text_or_sentinel(&Some("  ".into())), "none");
        assert_eq!(text_or_sentinel(&Some(" vegan ".into())), "vegan");
    }

    #[test]
    fn test_field_error_into_app_error() {
        let err: AppError = FieldError::new("phone", "bad phone").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.unwrap().get("field").unwrap(), "phone");

        let err: AppError = FieldError::new("date", "too early")
            .with_code(ErrorCode::DateInPast)
            .into();
        assert_eq!(err.code, ErrorCode::DateInPast);
        assert_eq!(err.message, "too early");
    }
}
