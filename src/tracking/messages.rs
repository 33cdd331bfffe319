use serde::{Deserialize, Serialize};

use crate::models::location::{Location, LocationSample};
use crate::models::order::{Order, OrderStatus};
use crate::models::requirement::Requirement;
use crate::models::truck::Truck;

/// Messages a subscriber may send over its tracking connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Ping,
    GetLocations,
    UpdateLocation { data: LocationSample },
}

/// Events pushed to tracking subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Pong,
    InitialData { data: InitialData },
    Locations { data: Vec<Location> },
    LocationUpdate { data: Location },
    OrderStatusUpdate { data: StatusUpdate },
    LocationUpdateAck { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: &'static str,
    pub status_display: &'static str,
}

impl StatusUpdate {
    pub fn from_status(status: OrderStatus) -> Self {
        Self {
            status: status.as_str(),
            status_display: status.display_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementSummary {
    pub title: String,
    pub from_location: String,
    pub to_location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: i64,
    pub order_number: String,
    pub status: &'static str,
    pub status_display: &'static str,
    pub driver_name: Option<String>,
    pub truck_registration: String,
    pub requirement: RequirementSummary,
}

impl OrderSummary {
    pub fn build(order: &Order, truck: &Truck, requirement: &Requirement) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status.as_str(),
            status_display: order.status.display_label(),
            driver_name: order.driver_name.clone(),
            truck_registration: truck.registration_number.clone(),
            requirement: RequirementSummary {
                title: requirement.title.clone(),
                from_location: requirement.from_location.clone(),
                to_location: requirement.to_location.clone(),
            },
        }
    }
}

/// Snapshot delivered to a freshly joined subscriber: the order summary,
/// the single most recent location (if any), and recent history
/// newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct InitialData {
    pub order: OrderSummary,
    pub current_location: Option<Location>,
    pub recent_locations: Vec<Location>,
}
