use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::api::{router, ApiState};
use crate::auth::testing::make_token;
use crate::testing::{make_test_matchmaker, test_endpoint};
use crate::TokenValidator;

const HMAC_KEY: &[u8] = b"somehmackey";

fn fresh_token(user_id: &str) -> String {
    make_token(
        user_id,
        (Utc::now() + Duration::hours(8)).timestamp(),
        HMAC_KEY,
    )
}

fn api() -> (axum::Router, Arc<crate::MatchmakerServer>) {
    let (server, _allocator) = make_test_matchmaker();
    let state = Arc::new(ApiState {
        server: Arc::clone(&server),
        validator: TokenValidator::with_hmac_key(HMAC_KEY),
    });
    (router(state), server)
}

fn request(method: Method, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/v1/matchmake");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn endpoints_require_a_bearer_token() {
    let (app, _server) = api();
    for method in [Method::POST, Method::GET, Method::DELETE] {
        let response = app
            .clone()
            .oneshot(request(method, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn forged_tokens_are_rejected() {
    let (app, _server) = api();
    let forged = make_token(
        "5",
        (Utc::now() + Duration::hours(8)).timestamp(),
        b"wrong-key",
    );
    let response = app
        .oneshot(request(Method::POST, Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn matchmake_check_cancel_round_trip() {
    let (app, server) = api();

    let response = app
        .clone()
        .oneshot(request(Method::POST, Some(&fresh_token("5"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(server.is_waiting("5"));

    // Pending status for the queued user.
    let response = app
        .clone()
        .oneshot(request(Method::GET, Some(&fresh_token("5"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let status: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status["ready"], false);
    assert_eq!(status["not_matchmaked"], false);

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, Some(&fresh_token("5"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!server.is_waiting("5"));
}

#[tokio::test]
async fn ready_status_reports_the_endpoint() {
    let (app, server) = api();
    server.matchmake("5");
    server.matchmake("1");
    server.pack_lobby().await;

    let response = app
        .oneshot(request(Method::GET, Some(&fresh_token("5"))))
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let status: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status["ready"], true);
    assert_eq!(status["ip"], test_endpoint().ip.as_str());
    assert_eq!(status["port"], test_endpoint().port);
}
