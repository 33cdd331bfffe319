use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch};

use crate::api::rest::principal;
use crate::error::AppError;
use crate::models::notification::Notification;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", patch(mark_read))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, AppError> {
    let caller = principal(&state, &headers)?;
    Ok(Json(state.store.notifications_for(caller.id)))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Notification>, AppError> {
    let caller = principal(&state, &headers)?;
    let notification = state.store.mark_notification_read(id, caller.id)?;
    Ok(Json(notification))
}
