//! # Integration Tests for backlot-api
//!
//! Tests the assembled application: health probes, authentication
//! middleware, the full arbitration flow from intake through outcome,
//! user administration rules, and OpenAPI spec generation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use backlot_api::state::{AppConfig, AppState};

/// Helper: build the test app with auth disabled.
fn test_app() -> axum::Router {
    backlot_api::app(AppState::new())
}

/// Helper: build the test app with auth enabled, returning the state too.
fn test_app_with_auth(token: &str) -> (axum::Router, AppState) {
    let config = AppConfig {
        port: 8080,
        auth_token: Some(token.to_string()),
    };
    let state = AppState::with_config(config, None);
    (backlot_api::app(state.clone()), state)
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn authed(mut request: Request<Body>, token: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("Authorization", format!("Bearer {token}").parse().unwrap());
    request
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn liveness_probe_is_open() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_probe_is_open() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn api_routes_require_token_when_auth_enabled() {
    let (app, _) = test_app_with_auth("lot-secret");
    let response = app.oneshot(get("/api/vehicles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_stays_open_when_auth_enabled() {
    let (app, _) = test_app_with_auth("lot-secret");
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn valid_token_reaches_api() {
    let (app, _) = test_app_with_auth("lot-secret");
    let response = app
        .oneshot(authed(get("/api/vehicles"), "lot-secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn seller_token_cannot_create_vehicles() {
    let (app, _) = test_app_with_auth("lot-secret");
    let body = serde_json::json!({
        "vin": "1HGCM82633A004352",
        "year": 2019,
        "make": "Honda",
        "model": "Accord"
    });
    let response = app
        .oneshot(authed(
            post_json("/api/vehicles", body),
            "seller::lot-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- Full Arbitration Flow ----------------------------------------------------

/// Intake → sale → open sold ARB → price adjustment outcome, end to end
/// through the assembled app with auth enabled.
#[tokio::test]
async fn sold_arb_price_adjustment_end_to_end() {
    let (_, state) = test_app_with_auth("lot-secret");
    let app = || backlot_api::app(state.clone());

    // Intake.
    let response = app()
        .oneshot(authed(
            post_json(
                "/api/vehicles",
                serde_json::json!({
                    "vin": "1HGCM82633A004352",
                    "year": 2019,
                    "make": "Honda",
                    "model": "Accord",
                    "bought_price": "14500",
                    "purchase_date": "2026-03-14"
                }),
            ),
            "lot-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let vehicle = body_json(response).await;
    let vehicle_id = vehicle["id"].as_str().unwrap().to_string();

    // Sale.
    let response = app()
        .oneshot(authed(
            post_json(
                &format!("/api/vehicles/{vehicle_id}/sale"),
                serde_json::json!({
                    "buyer_name": "Dana Whitfield",
                    "sold_price": "18500",
                    "sale_date": "2026-05-02"
                }),
            ),
            "lot-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sold = body_json(response).await;
    assert_eq!(sold["net_profit"], "4000.00");

    // Open the case.
    let response = app()
        .oneshot(authed(
            post_json(
                &format!("/api/vehicles/{vehicle_id}/arb"),
                serde_json::json!({"arb_type": "sold_arb", "notes": "buyer reports transmission slip"}),
            ),
            "lot-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let opened = body_json(response).await;
    assert_eq!(opened["case"]["outcome"], "pending");
    assert_eq!(opened["vehicle"]["status"], "arb");

    // Case appears in the list with a pending tally.
    let response = app()
        .oneshot(authed(get("/api/arb"), "lot-secret"))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list["tally"]["pending"], 1);
    assert_eq!(list["cases"][0]["vehicle"]["vin"], "1HGCM82633A004352");

    // Resolve: price adjustment of 1500.
    let response = app()
        .oneshot(authed(
            post_json(
                &format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({
                    "arb_type": "sold_arb",
                    "outcome": "price_adjustment",
                    "adjustment_amount": "1500"
                }),
            ),
            "lot-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = body_json(response).await;
    assert_eq!(resolved["case"]["outcome"], "price_adjustment");
    assert_eq!(resolved["case"]["adjustment_amount"], "1500.00");

    // Net profit dropped by exactly 1500.
    let response = app()
        .oneshot(authed(get(&format!("/api/vehicles/{vehicle_id}")), "lot-secret"))
        .await
        .unwrap();
    let after = body_json(response).await;
    assert_eq!(after["status"], "sold");
    assert_eq!(after["net_profit"], "2500.00");

    // A second submission conflicts.
    let response = app()
        .oneshot(authed(
            post_json(
                &format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({"arb_type": "sold_arb", "outcome": "denied"}),
            ),
            "lot-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // History shows the single resolved case.
    let response = app()
        .oneshot(authed(
            get(&format!("/api/vehicles/{vehicle_id}/arb/history")),
            "lot-secret",
        ))
        .await
        .unwrap();
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["case"]["outcome"], "price_adjustment");
}

/// Inventory ARB hard withdrawal drops the vehicle from the default
/// listing.
#[tokio::test]
async fn inventory_withdrawal_end_to_end() {
    let state = AppState::new();
    let app = || backlot_api::app(state.clone());

    let response = app()
        .oneshot(post_json(
            "/api/vehicles",
            serde_json::json!({
                "vin": "2T1BURHE5JC970034",
                "year": 2018,
                "make": "Toyota",
                "model": "Corolla",
                "bought_price": "9000"
            }),
        ))
        .await
        .unwrap();
    let vehicle = body_json(response).await;
    let vehicle_id = vehicle["id"].as_str().unwrap().to_string();

    let response = app()
        .oneshot(post_json(
            &format!("/api/vehicles/{vehicle_id}/arb"),
            serde_json::json!({"arb_type": "inventory_arb", "notes": "frame damage found"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app()
        .oneshot(post_json(
            &format!("/api/vehicles/{vehicle_id}/arb/outcome"),
            serde_json::json!({
                "arb_type": "inventory_arb",
                "outcome": "withdrawn",
                "confirm_withdrawal": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Purchase info gone, vehicle absent from the default listing.
    let response = app()
        .oneshot(get(&format!("/api/vehicles/{vehicle_id}")))
        .await
        .unwrap();
    let after = body_json(response).await;
    assert_eq!(after["status"], "withdrawn");
    assert!(after["bought_price"].is_null());

    let response = app().oneshot(get("/api/vehicles")).await.unwrap();
    let listing = body_json(response).await;
    assert!(listing.as_array().unwrap().is_empty());
}

// -- User Administration ------------------------------------------------------

#[tokio::test]
async fn user_create_get_roundtrip() {
    let state = AppState::new();
    let app = || backlot_api::app(state.clone());

    let response = app()
        .oneshot(post_json(
            "/api/users",
            serde_json::json!({
                "email": "dana@example.com",
                "password": "a-long-password",
                "role": "seller"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let user_id = created["id"].as_str().unwrap().to_string();

    let response = app()
        .oneshot(get(&format!("/api/users/{user_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["email"], "dana@example.com");
    assert_eq!(fetched["role"], "seller");
    assert_eq!(fetched["status"], "active");
}

#[tokio::test]
async fn protected_admin_rejects_patch_and_delete() {
    let state = AppState::new();
    let app = || backlot_api::app(state.clone());
    let admin_id = *state.admin_user_id.as_uuid();

    let response = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/users/{admin_id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({"status": "inactive"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{admin_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn openapi_spec_is_served() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]
        .as_object()
        .unwrap()
        .contains_key("/api/vehicles/{vehicle_id}/arb/outcome"));
}

// -- Error Shape --------------------------------------------------------------

#[tokio::test]
async fn errors_use_the_structured_body() {
    let state = AppState::new();
    let app = backlot_api::app(state);
    let response = app
        .oneshot(get(&format!("/api/vehicles/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].as_str().unwrap().contains("not found"));
}
