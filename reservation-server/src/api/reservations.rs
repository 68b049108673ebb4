//! Reservation submission and the success-page token lookup

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use http::StatusCode;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{ReservationRequest, ReservationSnapshot, SubmitResponse};

use crate::core::AppState;
use crate::handoff::HandoffError;

use super::{ApiResult, json_body};

/// Where the booking form sends a guest whose token did not resolve
pub const INVALID_TOKEN_REDIRECT: &str = "/form?error=invalid_token";

/// POST /reservations
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SubmitResponse>>), AppError> {
    let req = json_body(payload)?;
    let admitted = state.admission.submit(&req).await?;

    let redirect = format!("/success?token={}", admitted.token);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Reservation confirmed",
            SubmitResponse {
                token: admitted.token,
                redirect,
            },
        )),
    ))
}

#[derive(Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

/// GET /api/reservation-data?token=
pub async fn reservation_data(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<ReservationSnapshot> {
    match state.handoff.resolve(query.token.trim()).await {
        Ok(snapshot) => Ok(Json(ApiResponse::success(snapshot))),
        Err(HandoffError::NotFound) => Err(AppError::new(ErrorCode::HandoffTokenInvalid)
            .with_detail("redirect", INVALID_TOKEN_REDIRECT)),
        Err(HandoffError::Store(e)) => {
            tracing::warn!(error = %e, "Token store read failed");
            Err(AppError::store_unavailable())
        }
    }
}
