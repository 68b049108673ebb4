//! Per-slot availability for a date

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError};
use shared::models::{AvailabilityResponse, SlotAvailability};

use crate::core::AppState;
use crate::utils::time::{format_date, parse_date};
use crate::utils::validation::FieldError;

use super::ApiResult;

#[derive(Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: String,
}

/// GET /api/availability?date=
///
/// `full` is a hint only; admission re-checks atomically.
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<AvailabilityResponse> {
    let date = parse_date(&query.date)
        .ok_or_else(|| AppError::from(FieldError::new("date", "date must be YYYY-MM-DD")))?;
    let date_str = format_date(date);

    let settings = state.stores.settings.load_settings().await.map_err(|e| {
        tracing::warn!(error = %e, "Settings read failed");
        AppError::store_unavailable()
    })?;
    let counts = state.stores.slots.counts(&date_str).await.map_err(|e| {
        tracing::warn!(error = %e, "Slot counts read failed");
        AppError::store_unavailable()
    })?;

    let slots = state
        .policy
        .slots_for(date)
        .iter()
        .map(|entry| {
            let booked = counts.get(&entry.slot_id).copied().unwrap_or(0);
            let capacity = settings.capacity_for(entry.class);
            SlotAvailability {
                slot_id: entry.slot_id.clone(),
                class: entry.class,
                start_hour: entry.start_hour,
                end_hour: entry.end_hour,
                booked,
                capacity,
                full: booked >= capacity,
            }
        })
        .collect();

    Ok(Json(ApiResponse::success(AvailabilityResponse {
        date: date_str,
        day_type: state.policy.day_type(date),
        slots,
    })))
}
