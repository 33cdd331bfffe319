use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

/// An offer by a truck owner to fulfill a requirement. At most one bid
/// per (requirement, bidder); at most one bid per requirement ever
/// reaches `Accepted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub requirement_id: i64,
    pub bidder: i64,
    pub truck_id: i64,
    pub amount: Decimal,
    pub estimated_delivery_secs: i64,
    pub message: Option<String>,
    pub response_message: Option<String>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}
