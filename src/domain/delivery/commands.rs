use serde::{Deserialize, Serialize};
use std::fmt;

use super::value_objects::OrderItem;

// ============================================================================
// Delivery Commands - Represent caller intent
// ============================================================================

/// Creation payload, as received from the request gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelivery {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub customer_id: i64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Lifecycle transitions on an existing delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryCommand {
    Assign,
    MarkPickedUp,
    MarkInTransit,
    MarkDelivered,
    Cancel,
}

impl DeliveryCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryCommand::Assign => "Assign",
            DeliveryCommand::MarkPickedUp => "MarkPickedUp",
            DeliveryCommand::MarkInTransit => "MarkInTransit",
            DeliveryCommand::MarkDelivered => "MarkDelivered",
            DeliveryCommand::Cancel => "Cancel",
        }
    }
}

impl fmt::Display for DeliveryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
