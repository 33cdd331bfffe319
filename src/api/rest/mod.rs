pub mod bids;
pub mod notifications;
pub mod orders;
pub mod ws;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(bids::router())
        .merge(orders::router())
        .merge(notifications::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws/tracking/:order_ref", get(ws::tracking_ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the caller from the `x-user-id` header. Token issuance is
/// out of scope; identity is the seeded user record.
pub(crate) fn principal(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let raw = headers
        .get("x-user-id")
        .ok_or_else(|| AppError::Forbidden("missing x-user-id header".to_string()))?
        .to_str()
        .map_err(|_| AppError::InvalidArgument("malformed x-user-id header".to_string()))?;
    let id: i64 = raw
        .parse()
        .map_err(|_| AppError::InvalidArgument("malformed x-user-id header".to_string()))?;
    state
        .store
        .user(id)
        .map_err(|_| AppError::Forbidden(format!("unknown user {id}")))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    requirements: usize,
    bids: usize,
    orders: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        requirements: state.store.requirements.len(),
        bids: state.store.bids.len(),
        orders: state.store.orders.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
