use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Delivery Value Objects
// ============================================================================

/// Opaque delivery identifier.
///
/// Backed by a random v4 UUID, so generation needs no shared counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DeliveryId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for DeliveryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One line of the order being delivered. Owned by its delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    #[serde(alias = "price")]
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

/// Delivery status. Closed set; unknown strings fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
    /// Not reachable through any transition; kept so stored records carrying it still load.
    Failed,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 7] = [
        DeliveryStatus::Pending,
        DeliveryStatus::Assigned,
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
        DeliveryStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Assigned => "ASSIGNED",
            DeliveryStatus::PickedUp => "PICKED_UP",
            DeliveryStatus::InTransit => "IN_TRANSIT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Cancelled => "CANCELLED",
            DeliveryStatus::Failed => "FAILED",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered | DeliveryStatus::Cancelled | DeliveryStatus::Failed
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_ids_are_unique() {
        let a = DeliveryId::new();
        let b = DeliveryId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_delivery_id_parse_round_trip() {
        let id = DeliveryId::new();
        let parsed: DeliveryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DeliveryId>().is_err());
    }

    #[test]
    fn test_order_item_wire_format() {
        let item: OrderItem = serde_json::from_str(
            r#"{"productId":1,"productName":"Test Product","quantity":2,"unitPrice":25.99}"#,
        )
        .unwrap();

        assert_eq!(item.product_id, 1);
        assert_eq!(item.product_name, "Test Product");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, 25.99);

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"unitPrice\":25.99"));
        assert!(json.contains("\"productName\":\"Test Product\""));
    }

    #[test]
    fn test_order_item_accepts_legacy_price_field() {
        let item: OrderItem = serde_json::from_str(
            r#"{"productId":7,"productName":"Soup","quantity":1,"price":4.5}"#,
        )
        .unwrap();
        assert_eq!(item.unit_price, 4.5);
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: 1,
            product_name: "Test Product".to_string(),
            quantity: 2,
            unit_price: 25.99,
        };
        assert_eq!(item.line_total(), 51.98);
    }

    #[test]
    fn test_status_wire_names() {
        for status in DeliveryStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));

            let back: DeliveryStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_unknown_status_is_not_representable() {
        let result: Result<DeliveryStatus, _> = serde_json::from_str("\"PREPARING\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(DeliveryStatus::Delivered.is_terminal());
        assert!(DeliveryStatus::Cancelled.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(!DeliveryStatus::InTransit.is_terminal());
    }
}
