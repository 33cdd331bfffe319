use std::time::Instant;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::models::bid::{Bid, BidStatus};
use crate::models::notification::NotificationKind;
use crate::models::order::{Order, OrderStatus, PaymentStatus, generate_order_number};
use crate::models::requirement::{Requirement, RequirementStatus};
use crate::models::user::User;
use crate::observability::metrics::Metrics;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BidDecision {
    Accept,
    Reject,
}

/// Outcome of the accept/reject transition. `order` is present only
/// when the decision was accept.
#[derive(Debug, Clone, Serialize)]
pub struct BidResolution {
    pub bid: Bid,
    pub order: Option<Order>,
}

pub struct NewBid {
    pub truck_id: i64,
    pub amount: Decimal,
    pub estimated_delivery_secs: i64,
    pub message: Option<String>,
}

/// Places a pending bid on an open requirement.
pub fn place_bid(
    store: &EntityStore,
    bidder: &User,
    requirement_id: i64,
    new_bid: NewBid,
) -> Result<Bid, AppError> {
    let requirement = store.requirement(requirement_id)?;
    let now = Utc::now();

    if !requirement.is_bidding_open(now) {
        return Err(AppError::Conflict("bidding is closed".to_string()));
    }
    if new_bid.amount <= Decimal::ZERO {
        return Err(AppError::InvalidArgument(
            "bid amount must be positive".to_string(),
        ));
    }
    if new_bid.estimated_delivery_secs <= 0 {
        return Err(AppError::InvalidArgument(
            "estimated delivery duration must be positive".to_string(),
        ));
    }

    let truck = store.truck(new_bid.truck_id)?;
    if truck.owner != bidder.id {
        return Err(AppError::Forbidden(
            "truck belongs to another owner".to_string(),
        ));
    }
    if store.bid_exists_for(requirement_id, bidder.id) {
        return Err(AppError::Conflict(
            "bid already placed for this requirement".to_string(),
        ));
    }

    let bid = Bid {
        id: store.next_id(),
        requirement_id,
        bidder: bidder.id,
        truck_id: new_bid.truck_id,
        amount: new_bid.amount,
        estimated_delivery_secs: new_bid.estimated_delivery_secs,
        message: new_bid.message,
        response_message: None,
        status: BidStatus::Pending,
        created_at: now,
    };
    store.bids.insert(bid.id, bid.clone());

    store.notify(
        requirement.owner,
        "New Bid",
        format!(
            "{} placed a bid of {} on \"{}\"",
            bidder.username, bid.amount, requirement.title
        ),
        NotificationKind::BidPlaced,
        Some(requirement.id),
        None,
        Some(bid.id),
    );

    info!(bid_id = bid.id, requirement_id, bidder = bidder.id, "bid placed");
    Ok(bid)
}

/// Withdraws a pending bid; only the bidder may do this, and only
/// before the bid is resolved.
pub fn withdraw_bid(store: &EntityStore, bidder: &User, bid_id: i64) -> Result<Bid, AppError> {
    let mut bid = store.bid(bid_id)?;
    if bid.bidder != bidder.id {
        return Err(AppError::Forbidden(
            "bid belongs to another bidder".to_string(),
        ));
    }
    if bid.status != BidStatus::Pending {
        return Err(AppError::Conflict("bid already resolved".to_string()));
    }
    bid.status = BidStatus::Withdrawn;
    store.bids.insert(bid.id, bid.clone());
    Ok(bid)
}

/// The accept/reject transition. Accepting is a single atomic unit:
/// the target bid, the requirement, every sibling pending bid, the new
/// order and all notifications become visible together or not at all.
/// The per-requirement lock serializes concurrent resolutions, so two
/// accepts on sibling bids cannot both succeed.
pub async fn resolve_bid(
    store: &EntityStore,
    metrics: &Metrics,
    principal: &User,
    bid_id: i64,
    decision: BidDecision,
    response_message: Option<String>,
) -> Result<BidResolution, AppError> {
    let bid = store.bid(bid_id)?;
    let requirement = store.requirement(bid.requirement_id)?;

    if requirement.owner != principal.id {
        return Err(AppError::Forbidden(
            "only the requirement owner can respond to bids".to_string(),
        ));
    }

    let lock = store.requirement_lock(requirement.id);
    let _guard = lock.lock().await;

    // Re-read under the lock; a concurrent resolution may have landed
    // between the first read and lock acquisition.
    let mut bid = store.bid(bid_id)?;
    if bid.status != BidStatus::Pending {
        return Err(AppError::Conflict("bid already resolved".to_string()));
    }

    let start = Instant::now();
    let result = match decision {
        BidDecision::Reject => reject(store, bid, &requirement.title, response_message),
        BidDecision::Accept => {
            // The requirement status must also be re-checked here: a bid
            // placed while a concurrent accept was committing can still
            // be Pending even though its requirement is already
            // Assigned. Accepting it would mint a second order.
            let mut requirement = store.requirement(requirement.id)?;
            if requirement.status != RequirementStatus::Open {
                Err(AppError::Conflict(
                    "requirement is no longer open".to_string(),
                ))
            } else {
                bid.response_message = response_message;
                accept(store, metrics, &mut requirement, bid)
            }
        }
    };

    let outcome = match (&result, decision) {
        (Ok(_), BidDecision::Accept) => "accepted",
        (Ok(_), BidDecision::Reject) => "rejected",
        (Err(_), _) => "error",
    };
    metrics
        .resolution_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    metrics.bids_resolved_total.with_label_values(&[outcome]).inc();

    result
}

fn reject(
    store: &EntityStore,
    mut bid: Bid,
    requirement_title: &str,
    response_message: Option<String>,
) -> Result<BidResolution, AppError> {
    bid.status = BidStatus::Rejected;
    bid.response_message = response_message;
    store.bids.insert(bid.id, bid.clone());

    store.notify(
        bid.bidder,
        "Bid Rejected",
        format!("Your bid for \"{requirement_title}\" has been rejected."),
        NotificationKind::BidRejected,
        Some(bid.requirement_id),
        None,
        Some(bid.id),
    );

    info!(bid_id = bid.id, "bid rejected");
    Ok(BidResolution { bid, order: None })
}

fn accept(
    store: &EntityStore,
    metrics: &Metrics,
    requirement: &mut Requirement,
    mut bid: Bid,
) -> Result<BidResolution, AppError> {
    let now = Utc::now();
    let mut txn = store.begin();

    bid.status = BidStatus::Accepted;
    txn.stage_bid(bid.clone());

    requirement.status = RequirementStatus::Assigned;
    txn.stage_requirement(requirement.clone());

    for mut sibling in store.bids_for_requirement(requirement.id) {
        if sibling.id == bid.id || sibling.status != BidStatus::Pending {
            continue;
        }
        sibling.status = BidStatus::Rejected;
        sibling.response_message = Some("Another bid was selected".to_string());
        let notification = store.build_notification(
            sibling.bidder,
            "Bid Rejected",
            format!(
                "Your bid for \"{}\" was not selected.",
                requirement.title
            ),
            NotificationKind::BidRejected,
            Some(requirement.id),
            None,
            Some(sibling.id),
        );
        txn.stage_bid(sibling);
        txn.stage_notification(notification);
    }

    let order_id = store.next_id();
    let order_number = loop {
        let candidate = generate_order_number();
        if store.claim_order_number(&candidate, order_id) {
            break candidate;
        }
    };

    let order = Order {
        id: order_id,
        requirement_id: requirement.id,
        accepted_bid_id: bid.id,
        user: bid.bidder,
        truck_id: bid.truck_id,
        order_number,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        actual_pickup_time: None,
        actual_delivery_time: None,
        estimated_delivery_time: Some(now + Duration::seconds(bid.estimated_delivery_secs)),
        driver_name: None,
        driver_phone: None,
        rating: None,
        created_at: now,
    };
    txn.stage_order(order.clone());

    let notification = store.build_notification(
        bid.bidder,
        "Bid Accepted",
        format!("Your bid for \"{}\" has been accepted!", requirement.title),
        NotificationKind::BidAccepted,
        Some(requirement.id),
        Some(order.id),
        Some(bid.id),
    );
    txn.stage_notification(notification);

    txn.commit();
    metrics.orders_created_total.inc();

    info!(
        bid_id = bid.id,
        requirement_id = requirement.id,
        order_id = order.id,
        order_number = %order.order_number,
        "bid accepted, order created"
    );

    Ok(BidResolution {
        bid,
        order: Some(order),
    })
}
