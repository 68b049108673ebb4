//! HTTP routes

pub mod admin;
pub mod availability;
pub mod health;
pub mod line;
pub mod reservations;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use shared::error::{ApiResponse, AppError, ErrorCode};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::admin_auth_middleware;
use crate::auth::rate_limit::{login_rate_limit, submit_rate_limit};
use crate::core::AppState;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Unwrap a JSON body, turning extractor rejections into validation errors
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        AppError::with_message(ErrorCode::InvalidFormat, e.body_text())
    })
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Backstage (JWT authenticated)
    let admin = Router::new()
        .route(
            "/api/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route("/api/bookings", get(admin::list_bookings))
        .route("/api/check-auth", get(admin::check_auth))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    let login = Router::new()
        .route("/api/login", post(admin::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let submit = Router::new()
        .route("/reservations", post(reservations::submit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            submit_rate_limit,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/reservation-data", get(reservations::reservation_data))
        .route("/api/availability", get(availability::availability))
        .route("/api/line/bind", post(line::bind))
        .route("/api/logout", post(admin::logout))
        .merge(submit)
        .merge(login)
        .merge(admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
