use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::order::Order;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TrackingParams {
    pub user_id: Option<i64>,
}

/// Connection gateway for per-order tracking. Admission requires the
/// caller to be an admin or the order's truck owner; everyone else is
/// closed before any snapshot unless observer mode is enabled.
pub async fn tracking_ws_handler(
    ws: WebSocketUpgrade,
    Path(order_ref): Path<String>,
    Query(params): Query<TrackingParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, order_ref, params.user_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Participant,
    Observer,
}

/// Admission rule: admins and the order's truck owner subscribe as
/// participants; observer mode (diagnostics only) admits everyone else
/// read-only.
pub fn admitted(state: &AppState, order: &Order, principal: Option<&User>) -> Option<Admission> {
    let authorized = principal.is_some_and(|user| user.is_admin() || order.owner() == user.id);
    if authorized {
        return Some(Admission::Participant);
    }
    if state.config.allow_observer_mode {
        warn!(
            order_id = order.id,
            "admitting unauthorized subscriber: observer mode is enabled"
        );
        return Some(Admission::Observer);
    }
    None
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, order_ref: String, user_id: Option<i64>) {
    let room = format!("tracking_{order_ref}");

    let Ok(order) = state.store.order_by_ref(&order_ref) else {
        warn!(room = %room, "tracking connection rejected: order not found");
        return;
    };
    let principal = user_id.and_then(|id| state.store.user(id).ok());

    let Some(admission) = admitted(&state, &order, principal.as_ref()) else {
        warn!(
            room = %room,
            order_id = order.id,
            user_id = ?user_id,
            "tracking connection rejected: not authorized"
        );
        return;
    };

    let Ok((handle, mut rx)) = state.hub.join(&order, admission == Admission::Observer) else {
        warn!(order_id = order.id, "tracking join failed");
        return;
    };

    info!(room = %room, order_id = order.id, subscriber = %handle.id, "tracking client connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    // Dropped by the hub (slow consumer or shutdown).
                    break;
                };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        warn!(error = %err, "failed to serialize tracking event");
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        state.hub.handle_inbound(&handle, &text);
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.leave(&handle);
    info!(order_id = order.id, subscriber = %handle.id, "tracking client disconnected");
}
