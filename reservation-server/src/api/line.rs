//! LINE identity binding

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use shared::error::ApiResponse;
use shared::models::{BindIdentityRequest, LineIdentity};

use crate::core::AppState;

use super::{ApiResult, json_body};

/// POST /api/line/bind
pub async fn bind(
    State(state): State<AppState>,
    payload: Result<Json<BindIdentityRequest>, JsonRejection>,
) -> ApiResult<LineIdentity> {
    let req = json_body(payload)?;
    let identity = state.binder.bind(&req).await?;
    Ok(Json(ApiResponse::success(identity)))
}
