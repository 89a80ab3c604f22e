//! 全链路出入场流程测试
//!
//! 内存引擎 + 完整路由 (认证中间件、角色检查、JSON 序列化都参与)。

use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use parking_server::core::{Config, ServerState, build_app_with_state};
use parking_server::db::DbService;

async fn test_app() -> (axum::Router, Config) {
    let config = Config::from_env();
    let db = DbService::memory().await.expect("in-memory db").db;
    let state = ServerState::with_db(config.clone(), db).await;
    (build_app_with_state(state), config)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &axum::Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().expect("token in response").to_string()
}

#[tokio::test]
async fn test_full_checkout_flow() {
    let (app, config) = test_app().await;
    let token = login(&app, &config.admin_email, &config.admin_password).await;
    let token = Some(token.as_str());

    // Inventory setup
    let (status, floor) = send(
        &app,
        request(
            "POST",
            "/api/floors",
            token,
            Some(json!({ "name": "Level 1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let floor_id = floor["id"].as_str().unwrap().to_string();

    let (status, space_type) = send(
        &app,
        request(
            "POST",
            "/api/space-types",
            token,
            Some(json!({ "name": "Standard" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let type_id = space_type["id"].as_str().unwrap().to_string();

    let (status, space) = send(
        &app,
        request(
            "POST",
            "/api/spaces",
            token,
            Some(json!({ "number": "A-01", "floor": floor_id, "space_type": type_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let space_id = space["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/tariffs",
            token,
            Some(json!({
                "name": "Base rate",
                "space_type": type_id,
                "hourly_price": 5000.0,
                "daily_price": 100000.0,
                "monthly_price": 2000000.0,
                "valid_from": "2000-01-01"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Check-in: space flips to OCCUPIED
    let (status, check_in) = send(
        &app,
        request(
            "POST",
            "/api/sessions/check-in",
            token,
            Some(json!({ "plate": "abc123", "space_id": space_id, "contact_name": "Walk-in" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "check-in failed: {check_in}");
    assert_eq!(check_in["plate"], "ABC123");

    let (_, space) = send(
        &app,
        request("GET", &format!("/api/spaces/{space_id}"), token, None),
    )
    .await;
    assert_eq!(space["status"], "OCCUPIED");

    // Check-out right away: minimum one billable hour, PSE settles immediately
    let (status, check_out) = send(
        &app,
        request(
            "POST",
            "/api/sessions/check-out",
            token,
            Some(json!({ "space_id": space_id, "method": "PSE" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "check-out failed: {check_out}");
    assert_eq!(check_out["fee"]["billable_hours"], 1);
    assert_eq!(check_out["payment"]["amount"], 5000.0);
    assert_eq!(check_out["payment"]["status"], "PAID");

    let (_, space) = send(
        &app,
        request("GET", &format!("/api/spaces/{space_id}"), token, None),
    )
    .await;
    assert_eq!(space["status"], "AVAILABLE");

    // Payments listing reflects the settled charge
    let (status, payments) = send(&app, request("GET", "/api/payments", token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payments["paid_count"], 1);
    assert_eq!(payments["total_collected"], 5000.0);
    assert_eq!(payments["payments"][0]["plate"], "ABC123");

    // A second check-out of the same space is rejected
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/sessions/check-out",
            token,
            Some(json!({ "space_id": space_id, "method": "PSE" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_auth_is_enforced() {
    let (app, _) = test_app().await;

    // Health is public
    let (status, _) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    // API routes are not
    let (status, _) = send(&app, request("GET", "/api/spaces", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_cannot_reach_staff_routes() {
    let (app, _) = test_app().await;

    let (status, registered) = send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "document": "1234567890",
                "full_name": "Carla Cliente",
                "email": "carla@example.com",
                "password": "secret123",
                "password_confirm": "secret123"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {registered}");
    assert_eq!(registered["user"]["role"], "CUSTOMER");
    let token = registered["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request("GET", "/api/sessions", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Customer with nothing parked gets a clean 404 on self-service checkout
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/sessions/my/check-out",
            Some(&token),
            Some(json!({ "method": "CASH" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
