use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::rest::principal;
use crate::engine::resolution::{
    BidDecision, BidResolution, NewBid, place_bid, resolve_bid, withdraw_bid,
};
use crate::error::AppError;
use crate::models::bid::Bid;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/requirements/:id/bids",
            post(create_bid).get(list_requirement_bids),
        )
        .route("/bids/:id/respond", post(respond_to_bid))
        .route("/bids/:id/withdraw", post(withdraw))
        .route("/bids/:id", get(get_bid))
}

#[derive(Deserialize)]
pub struct CreateBidRequest {
    pub truck_id: i64,
    pub amount: Decimal,
    pub estimated_delivery_secs: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct BidResponseRequest {
    pub decision: BidDecision,
    #[serde(default)]
    pub response_message: Option<String>,
}

async fn create_bid(
    State(state): State<Arc<AppState>>,
    Path(requirement_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<CreateBidRequest>,
) -> Result<Json<Bid>, AppError> {
    let bidder = principal(&state, &headers)?;
    let bid = place_bid(
        &state.store,
        &bidder,
        requirement_id,
        NewBid {
            truck_id: payload.truck_id,
            amount: payload.amount,
            estimated_delivery_secs: payload.estimated_delivery_secs,
            message: payload.message,
        },
    )?;
    Ok(Json(bid))
}

async fn list_requirement_bids(
    State(state): State<Arc<AppState>>,
    Path(requirement_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Bid>>, AppError> {
    let caller = principal(&state, &headers)?;
    let requirement = state.store.requirement(requirement_id)?;
    if requirement.owner != caller.id {
        return Err(AppError::Forbidden(
            "only the requirement owner can list its bids".to_string(),
        ));
    }
    Ok(Json(state.store.bids_for_requirement(requirement_id)))
}

async fn respond_to_bid(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<BidResponseRequest>,
) -> Result<Json<BidResolution>, AppError> {
    let caller = principal(&state, &headers)?;
    let resolution = resolve_bid(
        &state.store,
        &state.metrics,
        &caller,
        bid_id,
        payload.decision,
        payload.response_message,
    )
    .await?;
    Ok(Json(resolution))
}

async fn withdraw(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Bid>, AppError> {
    let caller = principal(&state, &headers)?;
    let bid = withdraw_bid(&state.store, &caller, bid_id)?;
    Ok(Json(bid))
}

async fn get_bid(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Bid>, AppError> {
    let caller = principal(&state, &headers)?;
    let bid = state.store.bid(bid_id)?;
    let requirement = state.store.requirement(bid.requirement_id)?;
    if bid.bidder != caller.id && requirement.owner != caller.id {
        return Err(AppError::Forbidden("not a party to this bid".to_string()));
    }
    Ok(Json(bid))
}
