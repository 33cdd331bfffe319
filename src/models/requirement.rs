use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::truck::TruckType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Open,
    Closed,
    Assigned,
    Completed,
    Cancelled,
}

/// A shipment request posted by its owner, open for competitive bidding
/// until `bidding_end_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: i64,
    pub owner: i64,
    pub title: String,
    pub load_type: String,
    pub weight_tons: Decimal,
    pub truck_type: TruckType,
    pub from_location: String,
    pub to_location: String,
    pub pickup_date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub bidding_end_date: DateTime<Utc>,
    pub status: RequirementStatus,
    pub created_at: DateTime<Utc>,
}

impl Requirement {
    pub fn is_bidding_open(&self, now: DateTime<Utc>) -> bool {
        self.status == RequirementStatus::Open && now < self.bidding_end_date
    }
}
