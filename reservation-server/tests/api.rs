//! Router-level tests

mod common;

use axum::Router;
use axum::body::Body;
use common::{ADMIN_PASSWORD, SUNDAY, TUESDAY, phone, request, test_state};
use http::{Request, StatusCode};
use reservation_server::api::create_router;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    // Receipts are not under test; with the receiver gone, enqueue just drops them
    let (state, _rx) = test_state();
    create_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

async fn submit(app: &Router, phone: &str, date: &str, time: &str) -> (StatusCode, Value) {
    let body = serde_json::to_value(request(phone, date, time)).unwrap();
    send(app, post_json("/reservations", &body)).await
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/login",
            &json!({"username": "admin", "password": ADMIN_PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_backends() {
    let app = app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "redb");
    assert_eq!(body["tokens"], "memory");
}

#[tokio::test]
async fn test_submit_then_resolve_token() {
    let app = app();
    let (status, body) = submit(&app, "0912345678", TUESDAY, "11:00").await;
    assert_eq!(status, StatusCode::CREATED);

    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(
        body["data"]["redirect"],
        format!("/success?token={token}")
    );

    let uri = format!("/api/reservation-data?token={token}");
    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "0912345678");
    assert_eq!(body["data"]["party_size"], 2);
    assert_eq!(body["data"]["notes"], "none");

    // Refreshing the success page still works
    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_token_redirects_to_form() {
    let app = app();
    for uri in [
        "/api/reservation-data?token=0123456789abcdef0123456789abcdef",
        "/api/reservation-data",
    ] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["details"]["reason"], "invalid_token");
        assert_eq!(body["details"]["redirect"], "/form?error=invalid_token");
    }
}

#[tokio::test]
async fn test_rejection_reasons() {
    let app = app();

    let (status, body) = submit(&app, "12345", TUESDAY, "11:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["reason"], "invalid_format");
    assert_eq!(body["details"]["field"], "phone");

    let (status, body) = submit(&app, "0912345678", TUESDAY, "15:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["reason"], "invalid_slot");

    let (status, body) = submit(&app, "0912345678", "2000-01-01", "11:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "date");
    assert_eq!(body["details"]["reason"], "invalid_format");
    assert_eq!(body["code"], 4006);

    let (status, body) = send(
        &app,
        post_json("/reservations", &json!({"name": "missing everything"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["reason"], "invalid_format");
}

#[tokio::test]
async fn test_full_and_duplicate_are_conflicts() {
    let app = app();
    assert_eq!(submit(&app, phone(1).as_str(), TUESDAY, "13:00").await.0, StatusCode::CREATED);

    let (status, body) = submit(&app, phone(1).as_str(), TUESDAY, "13:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "duplicate_booking");

    assert_eq!(submit(&app, phone(2).as_str(), TUESDAY, "13:30").await.0, StatusCode::CREATED);
    let (status, body) = submit(&app, phone(3).as_str(), TUESDAY, "13:45").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "slot_full");
}

#[tokio::test]
async fn test_availability_counts() {
    let app = app();
    assert_eq!(submit(&app, phone(1).as_str(), SUNDAY, "14:00").await.0, StatusCode::CREATED);

    let (status, body) = send(&app, get(&format!("/api/availability?date={SUNDAY}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["day_type"], "holiday");

    let slots = body["data"]["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 7);
    let hm4 = slots.iter().find(|s| s["slot_id"] == "hm4").unwrap();
    assert_eq!(hm4["booked"], 1);
    assert_eq!(hm4["capacity"], 3);
    assert_eq!(hm4["full"], false);

    let (status, _) = send(&app, get("/api/availability?date=tomorrow")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = app();
    for uri in ["/api/settings", "/api/check-auth", "/api/bookings?date=2099-01-06"] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let (status, _) = send(&app, with_bearer(get("/api/settings"), "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        post_json("/api/login", &json!({"username": "admin", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_admin_settings_and_bookings() {
    let app = app();
    let token = admin_token(&app).await;

    let (status, body) = send(&app, with_bearer(get("/api/check-auth"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");

    let (status, body) = send(&app, with_bearer(get("/api/settings"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["weekday_morning"], 2);
    assert_eq!(body["data"]["holiday_afternoon"], 3);

    let bad = json!({
        "weekday_morning": 101,
        "weekday_afternoon": 2,
        "holiday_morning": 3,
        "holiday_afternoon": 3
    });
    let (status, body) = send(&app, with_bearer(post_json("/api/settings", &bad), &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "weekday_morning");

    let good = json!({
        "weekday_morning": 1,
        "weekday_afternoon": 4,
        "holiday_morning": 5,
        "holiday_afternoon": 6
    });
    let (status, body) = send(&app, with_bearer(post_json("/api/settings", &good), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated_by"], "admin");

    // Next admission uses the new capacity
    assert_eq!(submit(&app, phone(1).as_str(), TUESDAY, "11:00").await.0, StatusCode::CREATED);
    assert_eq!(submit(&app, phone(2).as_str(), TUESDAY, "11:15").await.0, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        with_bearer(get(&format!("/api/bookings?date={TUESDAY}")), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["data"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["phone"], phone(1));
    assert_eq!(bookings[0]["capacity_class"], "weekday_morning");

    let (status, _) = send(&app, post_json("/api/logout", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_line_bind_claims_token_once() {
    let app = app();
    let (_, body) = submit(&app, "0912345678", TUESDAY, "18:00").await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let bind = json!({"token": token, "line_user_id": "U42", "line_name": "Chen"});
    let (status, body) = send(&app, post_json("/api/line/bind", &bind)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "0912345678");

    let (status, body) = send(&app, post_json("/api/line/bind", &bind)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["reason"], "invalid_token");
}

#[tokio::test]
async fn test_submission_rate_limit() {
    let app = app();
    let body = json!({"name": "flood"});
    // X-Forwarded-For is not trusted by default, so rotating it changes nothing
    for i in 0..10 {
        let mut req = post_json("/reservations", &body);
        req.headers_mut()
            .insert("x-forwarded-for", format!("203.0.113.{i}").parse().unwrap());
        assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);
    }
    let mut req = post_json("/reservations", &body);
    req.headers_mut()
        .insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 1005);
}
