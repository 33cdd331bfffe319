use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::location::{Location, LocationSample};
use crate::models::order::{Order, OrderStatus};
use crate::observability::metrics::Metrics;
use crate::store::EntityStore;
use crate::tracking::messages::{
    InboundMessage, InitialData, OrderSummary, OutboundMessage, StatusUpdate,
};

/// Identifies one live subscription within an order's group. Holds no
/// channel itself; the hub owns the send side, so dropping a subscriber
/// from its group closes the receiver and ends the connection loop.
/// Observer handles are read-only: they receive the stream but may not
/// submit location updates.
#[derive(Debug, Clone, Copy)]
pub struct SubscriberHandle {
    pub id: Uuid,
    pub order_id: i64,
    pub observer: bool,
}

type Group = HashMap<Uuid, mpsc::Sender<OutboundMessage>>;

/// Per-order pub/sub. One subscriber group per order, created on first
/// join and discarded when the last subscriber leaves. Groups are
/// isolated from each other: publishing to one order never contends
/// with another order's group.
pub struct TrackingHub {
    groups: DashMap<i64, Group>,
    store: Arc<EntityStore>,
    buffer: usize,
    history_limit: usize,
    metrics: Metrics,
}

impl TrackingHub {
    pub fn new(
        store: Arc<EntityStore>,
        buffer: usize,
        history_limit: usize,
        metrics: Metrics,
    ) -> Self {
        Self {
            groups: DashMap::new(),
            store,
            buffer,
            history_limit,
            metrics,
        }
    }

    /// Registers a new subscriber under the order's group and delivers
    /// the initial snapshot into its channel. The group entry guard is
    /// held from insertion until the snapshot is enqueued, so a
    /// concurrent publish cannot slot an event ahead of the snapshot;
    /// snapshot plus live stream are gap-free and in order.
    pub fn join(
        &self,
        order: &Order,
        observer: bool,
    ) -> Result<(SubscriberHandle, mpsc::Receiver<OutboundMessage>), AppError> {
        let truck = self.store.truck(order.truck_id)?;
        let requirement = self.store.requirement(order.requirement_id)?;

        let (tx, rx) = mpsc::channel(self.buffer);
        let handle = SubscriberHandle {
            id: Uuid::new_v4(),
            order_id: order.id,
            observer,
        };

        {
            let mut group = self.groups.entry(order.id).or_default();
            group.insert(handle.id, tx.clone());
            self.metrics.tracking_subscribers.inc();

            let snapshot = InitialData {
                order: OrderSummary::build(order, &truck, &requirement),
                current_location: self.store.current_location(order.id),
                recent_locations: self.store.recent_locations(order.id, self.history_limit),
            };
            // The channel is fresh; the snapshot always fits.
            let _ = tx.try_send(OutboundMessage::InitialData { data: snapshot });
        }

        info!(
            order_id = order.id,
            subscriber = %handle.id,
            room = %format!("tracking_{}", order.order_number),
            "subscriber joined tracking group"
        );
        Ok((handle, rx))
    }

    /// Removes a subscriber; drops the group once it is empty. Safe to
    /// call for a subscriber the hub already dropped.
    pub fn leave(&self, handle: &SubscriberHandle) {
        if let Some(mut group) = self.groups.get_mut(&handle.order_id) {
            if group.remove(&handle.id).is_some() {
                self.metrics.tracking_subscribers.dec();
            }
            let empty = group.is_empty();
            drop(group);
            if empty {
                self.groups
                    .remove_if(&handle.order_id, |_, group| group.is_empty());
            }
        }
        debug!(order_id = handle.order_id, subscriber = %handle.id, "subscriber left");
    }

    pub fn subscriber_count(&self, order_id: i64) -> usize {
        self.groups.get(&order_id).map_or(0, |g| g.len())
    }

    /// Persists a location sample, then fans it out to every current
    /// subscriber of the order's group.
    pub fn publish_location(&self, order_id: i64, sample: LocationSample) -> Location {
        let location = self.store.create_location(order_id, sample);
        self.metrics.locations_published_total.inc();
        self.broadcast(
            order_id,
            OutboundMessage::LocationUpdate {
                data: location.clone(),
            },
        );
        location
    }

    /// Broadcasts a status change. Persistence is the lifecycle state
    /// machine's job; this is only the fan-out leg.
    pub fn publish_status(&self, order_id: i64, status: OrderStatus) {
        self.broadcast(
            order_id,
            OutboundMessage::OrderStatusUpdate {
                data: StatusUpdate::from_status(status),
            },
        );
    }

    /// Dispatches one inbound frame from a subscriber. Malformed frames
    /// get an `error` reply; the connection stays up either way.
    pub fn handle_inbound(&self, handle: &SubscriberHandle, text: &str) {
        let message = match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => message,
            Err(_) => {
                self.reply(handle, OutboundMessage::Error {
                    message: "Invalid message".to_string(),
                });
                return;
            }
        };

        match message {
            InboundMessage::Ping => self.reply(handle, OutboundMessage::Pong),
            InboundMessage::GetLocations => {
                let data = self.store.recent_locations(handle.order_id, self.history_limit);
                self.reply(handle, OutboundMessage::Locations { data });
            }
            InboundMessage::UpdateLocation { data } => {
                if handle.observer {
                    self.reply(handle, OutboundMessage::Error {
                        message: "Observers cannot submit location updates".to_string(),
                    });
                    return;
                }
                // Mobile-originated samples take the same persist +
                // fan-out path as producer submissions.
                self.publish_location(handle.order_id, data);
                self.reply(handle, OutboundMessage::LocationUpdateAck {
                    message: "Location update received".to_string(),
                });
            }
        }
    }

    /// Delivers an event to every subscriber of the group. A subscriber
    /// whose buffer is full (or whose receiver is gone) is dropped so
    /// one stalled client cannot queue without bound or hold up others.
    fn broadcast(&self, order_id: i64, message: OutboundMessage) {
        let Some(mut group) = self.groups.get_mut(&order_id) else {
            return;
        };

        let mut dropped: Vec<Uuid> = Vec::new();
        for (id, tx) in group.iter() {
            if tx.try_send(message.clone()).is_err() {
                dropped.push(*id);
            }
        }
        for id in dropped {
            group.remove(&id);
            self.metrics.tracking_subscribers.dec();
            debug!(order_id, subscriber = %id, "dropped unresponsive subscriber");
        }
    }

    fn reply(&self, handle: &SubscriberHandle, message: OutboundMessage) {
        if let Some(group) = self.groups.get(&handle.order_id)
            && let Some(tx) = group.get(&handle.id)
        {
            let _ = tx.try_send(message);
        }
    }
}
