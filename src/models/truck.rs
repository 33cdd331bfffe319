use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TruckType {
    Mini,
    Small,
    Medium,
    Large,
    Trailer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TruckStatus {
    Available,
    Busy,
    Maintenance,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    pub id: i64,
    pub owner: i64,
    pub truck_type: TruckType,
    pub capacity_tons: Decimal,
    pub registration_number: String,
    pub make_model: String,
    pub status: TruckStatus,
    pub created_at: DateTime<Utc>,
}
