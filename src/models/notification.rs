use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BidPlaced,
    BidAccepted,
    BidRejected,
    OrderStatusChanged,
    NewRequirement,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub requirement_id: Option<i64>,
    pub order_id: Option<i64>,
    pub bid_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
