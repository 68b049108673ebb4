//! Submission payload validation

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use shared::error::ErrorCode;
use shared::models::ReservationRequest;

use crate::utils::time::{parse_date, parse_time};
use crate::utils::validation::{
    FieldError, MAX_NAME_LEN, MAX_NOTES_CHARS, MAX_REMARK_LEN, is_valid_email, is_valid_phone,
    text_or_sentinel, validate_optional_text, validate_required_text,
};

pub const MIN_ADULTS: i32 = 1;
pub const MAX_ADULTS: i32 = 8;
pub const MAX_CHILDREN: i32 = 8;

/// A submission that passed every field check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub adults: i32,
    pub children: i32,
    pub high_chairs: i32,
    pub dietary: String,
    pub special_needs: String,
    pub notes: String,
}

/// Validate a submission against `today` (restaurant local date)
pub fn validate_request(
    req: &ReservationRequest,
    today: NaiveDate,
    deny_list: &HashSet<String>,
) -> Result<ValidatedRequest, FieldError> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;

    let phone = req.phone.trim();
    if !is_valid_phone(phone) {
        return Err(FieldError::new(
            "phone",
            "phone must be 10 digits starting with 09",
        ));
    }
    if deny_list.contains(phone) {
        return Err(FieldError::new(
            "phone",
            "this phone number cannot make reservations",
        )
        .with_code(ErrorCode::PhoneBlocked));
    }

    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(FieldError::new("email", "email format is invalid"));
    }

    let date = parse_date(&req.date)
        .ok_or_else(|| FieldError::new("date", "date must be YYYY-MM-DD"))?;
    if date < today {
        return Err(FieldError::new(
            "date",
            format!("date {date} is before today ({today})"),
        )
        .with_code(ErrorCode::DateInPast));
    }

    if req.time.trim().is_empty() {
        return Err(FieldError::new("time", "time must not be empty"));
    }
    let time = parse_time(&req.time).ok_or_else(|| FieldError::new("time", "time must be HH:MM"))?;

    if !(MIN_ADULTS..=MAX_ADULTS).contains(&req.adults) {
        return Err(FieldError::new(
            "adults",
            format!("adults must be between {MIN_ADULTS} and {MAX_ADULTS}"),
        ));
    }
    if !(0..=MAX_CHILDREN).contains(&req.children) {
        return Err(FieldError::new(
            "children",
            format!("children must be between 0 and {MAX_CHILDREN}"),
        ));
    }
    if req.high_chairs < 0 || req.high_chairs > req.children {
        return Err(FieldError::new(
            "high_chairs",
            "high chairs cannot exceed the number of children",
        ));
    }

    validate_optional_text(&req.dietary, "dietary", MAX_REMARK_LEN)?;
    validate_optional_text(&req.special_needs, "special_needs", MAX_REMARK_LEN)?;
    validate_optional_text(&req.notes, "notes", MAX_NOTES_CHARS)?;

    Ok(ValidatedRequest {
        name: req.name.trim().to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        date,
        time,
        adults: req.adults,
        children: req.children,
        high_chairs: req.high_chairs,
        dietary: text_or_sentinel(&req.dietary),
        special_needs: text_or_sentinel(&req.special_needs),
        notes: text_or_sentinel(&req.notes),
    })
}
