//! The JSON gateway: three idempotent endpoints on one route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::{AuthError, GameClaims, TokenValidator};
use crate::{MatchmakeStatus, MatchmakerServer};

pub struct ApiState {
    pub server: Arc<MatchmakerServer>,
    pub validator: TokenValidator,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/v1/matchmake",
            post(matchmake).get(check_status).delete(cancel_matchmake),
        )
        .with_state(state)
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

fn authorize(state: &ApiState, headers: &HeaderMap) -> Result<GameClaims, AuthError> {
    state.validator.claims_from_headers(headers)
}

#[derive(Serialize)]
struct Empty {}

async fn matchmake(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<Empty>, AuthError> {
    let claims = authorize(&state, &headers)?;
    log::info!("user {}: request to matchmake", claims.user_id);
    state.server.matchmake(&claims.user_id);
    Ok(Json(Empty {}))
}

async fn check_status(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<MatchmakeStatus>, AuthError> {
    let claims = authorize(&state, &headers)?;
    log::info!("user {}: request to check matchmaking state", claims.user_id);
    Ok(Json(state.server.check_status(&claims.user_id)))
}

async fn cancel_matchmake(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<Empty>, AuthError> {
    let claims = authorize(&state, &headers)?;
    log::info!("user {}: request to cancel matchmaking", claims.user_id);
    state.server.cancel(&claims.user_id);
    Ok(Json(Empty {}))
}
