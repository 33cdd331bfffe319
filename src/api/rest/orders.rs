use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use serde::Deserialize;

use crate::api::rest::principal;
use crate::engine::lifecycle::advance_order_status;
use crate::error::AppError;
use crate::models::location::{Location, LocationSample};
use crate::models::order::Order;
use crate::models::user::User;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:order_ref", get(get_order))
        .route("/orders/:order_ref/status", patch(update_status))
        .route(
            "/orders/:order_ref/locations",
            post(submit_location).get(list_locations),
        )
        .route("/orders/:order_ref/locations/current", get(current_location))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn authorize_party(state: &AppState, caller: &User, order: &Order) -> Result<(), AppError> {
    let requirement = state.store.requirement(order.requirement_id)?;
    if order.owner() != caller.id && requirement.owner != caller.id {
        return Err(AppError::Forbidden("not a party to this order".to_string()));
    }
    Ok(())
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_ref): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Order>, AppError> {
    let caller = principal(&state, &headers)?;
    let order = state.store.order_by_ref(&order_ref)?;
    authorize_party(&state, &caller, &order)?;
    Ok(Json(order))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(order_ref): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let caller = principal(&state, &headers)?;
    let order = state.store.order_by_ref(&order_ref)?;

    let updated = advance_order_status(&state.store, &caller, order.id, &payload.status)?;
    state.hub.publish_status(updated.id, updated.status);

    Ok(Json(updated))
}

async fn submit_location(
    State(state): State<Arc<AppState>>,
    Path(order_ref): Path<String>,
    headers: HeaderMap,
    Json(sample): Json<LocationSample>,
) -> Result<Json<Location>, AppError> {
    let caller = principal(&state, &headers)?;
    let order = state.store.order_by_ref(&order_ref)?;
    authorize_party(&state, &caller, &order)?;

    let location = state.hub.publish_location(order.id, sample);
    Ok(Json(location))
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Path(order_ref): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Location>>, AppError> {
    let caller = principal(&state, &headers)?;
    let order = state.store.order_by_ref(&order_ref)?;
    authorize_party(&state, &caller, &order)?;

    let limit = state.config.location_history_limit;
    Ok(Json(state.store.recent_locations(order.id, limit)))
}

async fn current_location(
    State(state): State<Arc<AppState>>,
    Path(order_ref): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Location>, AppError> {
    let caller = principal(&state, &headers)?;
    let order = state.store.order_by_ref(&order_ref)?;
    authorize_party(&state, &caller, &order)?;

    state
        .store
        .current_location(order.id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no location data available".to_string()))
}
