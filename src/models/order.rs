use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    PickupScheduled,
    Loaded,
    OnTheWay,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Parses the wire form (`snake_case`) of a status.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "pickup_scheduled" => Some(Self::PickupScheduled),
            "loaded" => Some(Self::Loaded),
            "on_the_way" => Some(Self::OnTheWay),
            "delivered" => Some(Self::Delivered),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::PickupScheduled => "pickup_scheduled",
            Self::Loaded => "loaded",
            Self::OnTheWay => "on_the_way",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label shown to both parties.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::PickupScheduled => "Pickup Scheduled",
            Self::Loaded => "Loaded",
            Self::OnTheWay => "On The Way",
            Self::Delivered => "Delivered",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Refunded,
}

/// The binding contract created when a bid is accepted. Exactly one per
/// requirement; `order_number` is assigned at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub requirement_id: i64,
    pub accepted_bid_id: i64,
    pub user: i64,
    pub truck_id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// The truck owner fulfilling this order.
    pub fn owner(&self) -> i64 {
        self.user
    }
}

/// Generates a candidate order number. Uniqueness is enforced by the
/// store at creation time; callers regenerate on collision.
pub fn generate_order_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", raw[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::{OrderStatus, generate_order_number};

    #[test]
    fn order_number_has_expected_shape() {
        let n = generate_order_number();
        assert!(n.starts_with("ORD-"));
        assert_eq!(n.len(), 12);
        assert!(n[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn status_parse_round_trips() {
        for raw in [
            "pending",
            "confirmed",
            "pickup_scheduled",
            "loaded",
            "on_the_way",
            "delivered",
            "completed",
            "cancelled",
        ] {
            let status = OrderStatus::parse(raw).unwrap();
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(OrderStatus::parse("teleported").is_none());
    }

    #[test]
    fn display_labels_are_human_readable() {
        assert_eq!(OrderStatus::OnTheWay.display_label(), "On The Way");
        assert_eq!(OrderStatus::PickupScheduled.display_label(), "Pickup Scheduled");
    }
}
