use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event_sourcing::DomainEvent;
use super::value_objects::{DeliveryId, OrderItem};

// ============================================================================
// Delivery Events - facts produced by accepted commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DeliveryEvent {
    Created(DeliveryCreated),
    Assigned { assigned_at: DateTime<Utc> },
    PickedUp { picked_up_at: DateTime<Utc> },
    InTransit { departed_at: DateTime<Utc> },
    Delivered { delivered_at: DateTime<Utc> },
    Cancelled { cancelled_at: DateTime<Utc> },
}

impl DeliveryEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DeliveryEvent::Created(e) => e.created_at,
            DeliveryEvent::Assigned { assigned_at } => *assigned_at,
            DeliveryEvent::PickedUp { picked_up_at } => *picked_up_at,
            DeliveryEvent::InTransit { departed_at } => *departed_at,
            DeliveryEvent::Delivered { delivered_at } => *delivered_at,
            DeliveryEvent::Cancelled { cancelled_at } => *cancelled_at,
        }
    }
}

impl DomainEvent for DeliveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryEvent::Created(_) => "DeliveryCreated",
            DeliveryEvent::Assigned { .. } => "DeliveryAssigned",
            DeliveryEvent::PickedUp { .. } => "DeliveryPickedUp",
            DeliveryEvent::InTransit { .. } => "DeliveryInTransit",
            DeliveryEvent::Delivered { .. } => "DeliveryDelivered",
            DeliveryEvent::Cancelled { .. } => "DeliveryCancelled",
        }
    }
}

/// Delivery Created - initial event in the lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryCreated {
    pub delivery_id: DeliveryId,
    pub order_id: String,
    pub customer_id: i64,
    pub address: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}
