use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::bid::{Bid, BidStatus};
use crate::models::location::{Location, LocationSample};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::order::Order;
use crate::models::requirement::Requirement;
use crate::models::truck::Truck;
use crate::models::user::User;

/// In-process entity store. Holds one map per entity, hands out ids from
/// a shared counter, and provides the two primitives the resolution
/// engine needs: a staged multi-write transaction and a per-requirement
/// exclusive lock.
pub struct EntityStore {
    pub users: DashMap<i64, User>,
    pub trucks: DashMap<i64, Truck>,
    pub requirements: DashMap<i64, Requirement>,
    pub bids: DashMap<i64, Bid>,
    pub orders: DashMap<i64, Order>,
    pub locations: DashMap<i64, Location>,
    pub notifications: DashMap<i64, Notification>,
    order_numbers: DashMap<String, i64>,
    requirement_locks: DashMap<i64, Arc<Mutex<()>>>,
    next_id: AtomicI64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            trucks: DashMap::new(),
            requirements: DashMap::new(),
            bids: DashMap::new(),
            orders: DashMap::new(),
            locations: DashMap::new(),
            notifications: DashMap::new(),
            order_numbers: DashMap::new(),
            requirement_locks: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Serializes the five-step accept transition per requirement.
    /// Different requirements get independent locks.
    pub fn requirement_lock(&self, requirement_id: i64) -> Arc<Mutex<()>> {
        self.requirement_locks
            .entry(requirement_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Claims an order number; false if it was already issued.
    pub fn claim_order_number(&self, number: &str, order_id: i64) -> bool {
        let mut claimed = false;
        self.order_numbers
            .entry(number.to_string())
            .or_insert_with(|| {
                claimed = true;
                order_id
            });
        claimed
    }

    pub fn begin(&self) -> Txn<'_> {
        Txn {
            store: self,
            bids: Vec::new(),
            requirements: Vec::new(),
            orders: Vec::new(),
            notifications: Vec::new(),
        }
    }

    // ----- reads -----

    pub fn user(&self, id: i64) -> Result<User, AppError> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }

    pub fn truck(&self, id: i64) -> Result<Truck, AppError> {
        self.trucks
            .get(&id)
            .map(|t| t.clone())
            .ok_or_else(|| AppError::NotFound(format!("truck {id} not found")))
    }

    pub fn requirement(&self, id: i64) -> Result<Requirement, AppError> {
        self.requirements
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| AppError::NotFound(format!("requirement {id} not found")))
    }

    pub fn bid(&self, id: i64) -> Result<Bid, AppError> {
        self.bids
            .get(&id)
            .map(|b| b.clone())
            .ok_or_else(|| AppError::NotFound(format!("bid {id} not found")))
    }

    pub fn order(&self, id: i64) -> Result<Order, AppError> {
        self.orders
            .get(&id)
            .map(|o| o.clone())
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }

    /// Resolves an order reference: numeric id first, then the
    /// human-readable order number.
    pub fn order_by_ref(&self, order_ref: &str) -> Result<Order, AppError> {
        if let Ok(id) = order_ref.parse::<i64>()
            && let Some(order) = self.orders.get(&id)
        {
            return Ok(order.clone());
        }
        if let Some(id) = self.order_numbers.get(order_ref)
            && let Some(order) = self.orders.get(id.value())
        {
            return Ok(order.clone());
        }
        Err(AppError::NotFound(format!("order {order_ref} not found")))
    }

    pub fn bids_for_requirement(&self, requirement_id: i64) -> Vec<Bid> {
        let mut bids: Vec<Bid> = self
            .bids
            .iter()
            .filter(|entry| entry.value().requirement_id == requirement_id)
            .map(|entry| entry.value().clone())
            .collect();
        bids.sort_by_key(|b| b.id);
        bids
    }

    pub fn bid_exists_for(&self, requirement_id: i64, bidder: i64) -> bool {
        self.bids.iter().any(|entry| {
            let bid = entry.value();
            bid.requirement_id == requirement_id
                && bid.bidder == bidder
                && bid.status != BidStatus::Withdrawn
        })
    }

    /// Locations for an order, newest first, capped at `limit`.
    pub fn recent_locations(&self, order_id: i64, limit: usize) -> Vec<Location> {
        let mut rows: Vec<Location> = self
            .locations
            .iter()
            .filter(|entry| entry.value().order_id == order_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        rows
    }

    pub fn current_location(&self, order_id: i64) -> Option<Location> {
        self.recent_locations(order_id, 1).into_iter().next()
    }

    pub fn notifications_for(&self, user: i64) -> Vec<Notification> {
        let mut rows: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.value().user == user)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    // ----- writes -----

    /// Appends a location row with a server-assigned timestamp.
    pub fn create_location(&self, order_id: i64, sample: LocationSample) -> Location {
        let location = Location {
            id: self.next_id(),
            order_id,
            latitude: sample.latitude,
            longitude: sample.longitude,
            address: sample.address,
            speed: sample.speed,
            heading: sample.heading,
            altitude: sample.altitude,
            accuracy: sample.accuracy,
            timestamp: Utc::now(),
        };
        self.locations.insert(location.id, location.clone());
        location
    }

    /// Builds a notification record without inserting it; used for
    /// staging inside a transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn build_notification(
        &self,
        user: i64,
        title: &str,
        message: String,
        kind: NotificationKind,
        requirement_id: Option<i64>,
        order_id: Option<i64>,
        bid_id: Option<i64>,
    ) -> Notification {
        Notification {
            id: self.next_id(),
            user,
            title: title.to_string(),
            message,
            kind,
            is_read: false,
            requirement_id,
            order_id,
            bid_id,
            created_at: Utc::now(),
        }
    }

    /// Notification producer interface; inserts immediately.
    #[allow(clippy::too_many_arguments)]
    pub fn notify(
        &self,
        user: i64,
        title: &str,
        message: String,
        kind: NotificationKind,
        requirement_id: Option<i64>,
        order_id: Option<i64>,
        bid_id: Option<i64>,
    ) -> Notification {
        let notification =
            self.build_notification(user, title, message, kind, requirement_id, order_id, bid_id);
        self.notifications
            .insert(notification.id, notification.clone());
        notification
    }

    pub fn mark_notification_read(&self, id: i64, user: i64) -> Result<Notification, AppError> {
        let mut entry = self
            .notifications
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("notification {id} not found")))?;
        if entry.user != user {
            return Err(AppError::Forbidden(
                "notification belongs to another user".to_string(),
            ));
        }
        entry.is_read = true;
        Ok(entry.clone())
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Staged multi-write transaction: nothing staged is visible to readers
/// until `commit`. The caller is expected to hold the relevant
/// requirement lock, which makes stage-then-commit an atomic unit from
/// every other task's point of view.
pub struct Txn<'a> {
    store: &'a EntityStore,
    bids: Vec<Bid>,
    requirements: Vec<Requirement>,
    orders: Vec<Order>,
    notifications: Vec<Notification>,
}

impl Txn<'_> {
    pub fn stage_bid(&mut self, bid: Bid) {
        self.bids.push(bid);
    }

    pub fn stage_requirement(&mut self, requirement: Requirement) {
        self.requirements.push(requirement);
    }

    pub fn stage_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn stage_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn commit(self) {
        for bid in self.bids {
            self.store.bids.insert(bid.id, bid);
        }
        for requirement in self.requirements {
            self.store.requirements.insert(requirement.id, requirement);
        }
        for order in self.orders {
            self.store.orders.insert(order.id, order);
        }
        for notification in self.notifications {
            self.store.notifications.insert(notification.id, notification);
        }
    }
}
