//! Backstage endpoints: session, capacity settings, booking list

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{CapacitySettings, CapacitySettingsUpdate, MAX_SLOT_CAPACITY, ReservationRecord};

use crate::auth::admin::{JWT_EXPIRY_HOURS, create_token};
use crate::auth::password::verify_password;
use crate::auth::AdminIdentity;
use crate::core::AppState;
use crate::utils::time::{format_date, parse_date};
use crate::utils::validation::{FieldError, MAX_PASSWORD_LEN};

use super::{ApiResult, json_body};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let req = json_body(payload)?;

    if req.password.len() > MAX_PASSWORD_LEN
        || req.username.trim() != state.config.admin_username
        || !verify_password(&req.password, &state.config.admin_password_hash)
    {
        tracing::warn!(username = %req.username, "Admin login failed");
        return Err(AppError::invalid_credentials());
    }

    let token = create_token(&state.config.admin_username, &state.config.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(username = %state.config.admin_username, "Admin logged in");
    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        expires_in: JWT_EXPIRY_HOURS * 3600,
    })))
}

/// GET /api/check-auth
pub async fn check_auth(Extension(admin): Extension<AdminIdentity>) -> ApiResult<serde_json::Value> {
    Ok(Json(ApiResponse::success(serde_json::json!({
        "authenticated": true,
        "username": admin.username,
    }))))
}

/// POST /api/logout
///
/// Sessions are stateless; the client drops its token.
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::ok())
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<CapacitySettings> {
    let settings = state.stores.settings.load_settings().await.map_err(|e| {
        tracing::warn!(error = %e, "Settings read failed");
        AppError::store_unavailable()
    })?;
    Ok(Json(ApiResponse::success(settings)))
}

/// POST /api/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    payload: Result<Json<CapacitySettingsUpdate>, JsonRejection>,
) -> ApiResult<CapacitySettings> {
    let update = json_body(payload)?;
    if let Some(field) = update.out_of_range_field() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be between 0 and {MAX_SLOT_CAPACITY}"),
        )
        .with_detail("field", field));
    }

    let settings = update.into_settings(shared::util::now_millis(), Some(admin.username));
    state
        .stores
        .settings
        .save_settings(&settings)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Settings write failed");
            AppError::store_unavailable()
        })?;

    tracing::info!(
        weekday_morning = settings.weekday_morning,
        weekday_afternoon = settings.weekday_afternoon,
        holiday_morning = settings.holiday_morning,
        holiday_afternoon = settings.holiday_afternoon,
        updated_by = ?settings.updated_by,
        "Capacity settings updated"
    );
    Ok(Json(ApiResponse::success_with_message("Settings saved", settings)))
}

#[derive(Deserialize)]
pub struct BookingsQuery {
    #[serde(default)]
    pub date: String,
}

/// GET /api/bookings?date=
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Vec<ReservationRecord>> {
    let date = parse_date(&query.date)
        .ok_or_else(|| AppError::from(FieldError::new("date", "date must be YYYY-MM-DD")))?;
    let records = state
        .stores
        .ledger
        .list_by_date(&format_date(date))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Booking list read failed");
            AppError::store_unavailable()
        })?;
    Ok(Json(ApiResponse::success(records)))
}
