#![cfg(feature = "axum")]

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
    routing::get,
};
use clubhub::Hub;
use clubhub::adapters::MemoryDatabaseAdapter;
use clubhub::handlers::AxumIntegration;
use common::TestHarness;
use serde_json::{Value, json};
use tower::ServiceExt; // for oneshot

/// Mount the hub under `/api` next to an unrelated route, the way the
/// server binary does.
fn create_test_router(hub: Arc<Hub<MemoryDatabaseAdapter>>) -> Router {
    Router::new()
        .route(
            "/public",
            get(|| async { axum::Json(json!({ "status": "ok" })) }),
        )
        .nest("/api", hub.clone().axum_router())
        .with_state(hub)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_axum_health_and_public_routes() {
    let h = TestHarness::new().await;
    let router = create_test_router(h.arc());

    let response = router
        .clone()
        .oneshot(get_request("/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ClubHub");

    let response = router.oneshot(get_request("/public", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_axum_signup_and_me() {
    let h = TestHarness::new().await;
    let router = create_test_router(h.arc());

    let response = router
        .clone()
        .oneshot(post(
            "/api/sign-up",
            None,
            json!({ "name": "Asha", "email": "asha@campus.edu", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = read_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Mixed-case header names reach the hub lowercased
    let response = router
        .oneshot(get_request("/api/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["user"]["email"], "asha@campus.edu");
    assert_eq!(body["memberships"], json!([]));
}

#[tokio::test]
async fn test_axum_errors_map_to_status_codes() {
    let h = TestHarness::new().await;
    let router = create_test_router(h.arc());

    let response = router
        .clone()
        .oneshot(get_request("/api/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(read_json(response).await["message"].is_string());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/sign-in")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(post("/api/sign-in", None, json!({ "email": "nope", "password": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(get_request("/api/does-not-exist", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_axum_query_parameters_are_decoded() {
    let h = TestHarness::new().await;
    let admin = h.admin().await;
    let coordinator = h.coordinator("Coord").await;
    let club = h.club(&admin, "Robotics", &coordinator).await;
    let router = create_test_router(h.arc());

    let uri = format!("/api/event/list?clubId={club}&status=published%2Congoing");
    let response = router
        .clone()
        .oneshot(get_request(&uri, Some(&admin.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["events"], json!([]));

    let response = router
        .oneshot(get_request("/api/event/list?status=bogus", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
