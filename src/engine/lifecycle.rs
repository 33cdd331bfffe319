use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::models::notification::NotificationKind;
use crate::models::order::{Order, OrderStatus};
use crate::models::requirement::RequirementStatus;
use crate::models::user::User;
use crate::store::EntityStore;

/// Applies an order status transition. Any enumerated target is
/// accepted from any source (the marketplace allows manual correction);
/// unknown status strings fail before any mutation. Side effects:
/// pickup/delivery timestamps are derived once, the other party is
/// notified on every real change, and completing an order completes
/// its requirement.
pub fn advance_order_status(
    store: &EntityStore,
    actor: &User,
    order_id: i64,
    raw_status: &str,
) -> Result<Order, AppError> {
    let new_status = OrderStatus::parse(raw_status)
        .ok_or_else(|| AppError::InvalidArgument(format!("unknown order status: {raw_status}")))?;

    let mut order = store.order(order_id)?;
    let requirement = store.requirement(order.requirement_id)?;

    let actor_is_truck_owner = order.owner() == actor.id;
    let actor_is_requirement_owner = requirement.owner == actor.id;
    if !actor_is_truck_owner && !actor_is_requirement_owner {
        return Err(AppError::Forbidden(
            "not a party to this order".to_string(),
        ));
    }

    let old_status = order.status;
    order.status = new_status;

    let now = Utc::now();
    if new_status == OrderStatus::Loaded && order.actual_pickup_time.is_none() {
        order.actual_pickup_time = Some(now);
    }
    if new_status == OrderStatus::Delivered && order.actual_delivery_time.is_none() {
        order.actual_delivery_time = Some(now);
    }

    store.orders.insert(order.id, order.clone());

    if new_status == OrderStatus::Completed && requirement.status != RequirementStatus::Completed {
        let mut requirement = requirement.clone();
        requirement.status = RequirementStatus::Completed;
        store.requirements.insert(requirement.id, requirement);
    }

    if old_status != new_status {
        let recipient = if actor_is_truck_owner {
            requirement.owner
        } else {
            order.owner()
        };
        store.notify(
            recipient,
            "Order Status Updated",
            format!(
                "Order {} status changed to {}",
                order.order_number,
                new_status.display_label()
            ),
            NotificationKind::OrderStatusChanged,
            Some(requirement.id),
            Some(order.id),
            None,
        );
    }

    info!(
        order_id = order.id,
        order_number = %order.order_number,
        from = old_status.as_str(),
        to = new_status.as_str(),
        "order status updated"
    );

    Ok(order)
}
