use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One GPS sample for an order. Append-only; the newest row by
/// `timestamp` is the order's current location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub order_id: i64,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub address: Option<String>,
    pub speed: Option<Decimal>,
    pub heading: Option<Decimal>,
    pub altitude: Option<Decimal>,
    pub accuracy: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Client-supplied fields of a sample; id and timestamp are assigned by
/// the server when the sample is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: Decimal,
    pub longitude: Decimal,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub speed: Option<Decimal>,
    #[serde(default)]
    pub heading: Option<Decimal>,
    #[serde(default)]
    pub altitude: Option<Decimal>,
    #[serde(default)]
    pub accuracy: Option<Decimal>,
}
