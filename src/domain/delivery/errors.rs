use chrono::{DateTime, Utc};

use super::commands::DeliveryCommand;
use super::value_objects::DeliveryStatus;

// ============================================================================
// Delivery Business Rule Errors
// ============================================================================

/// Rejected creation input. Checked in declaration order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Order id is required")]
    MissingOrderId,

    #[error("Invalid customer id: {0}")]
    InvalidCustomerId(i64),

    #[error("Delivery address is required")]
    MissingAddress,

    #[error("Delivery must contain at least one item")]
    EmptyItems,

    #[error("Item {index} has invalid quantity: {quantity}")]
    InvalidItemQuantity { index: usize, quantity: i32 },

    #[error("Item {index} has invalid unit price: {unit_price}")]
    InvalidItemPrice { index: usize, unit_price: f64 },
}

impl ValidationError {
    /// Stable reason code for client branching.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingOrderId => "MISSING_ORDER_ID",
            ValidationError::InvalidCustomerId(_) => "INVALID_CUSTOMER_ID",
            ValidationError::MissingAddress => "MISSING_ADDRESS",
            ValidationError::EmptyItems => "EMPTY_ITEMS",
            ValidationError::InvalidItemQuantity { .. } => "INVALID_ITEM_QUANTITY",
            ValidationError::InvalidItemPrice { .. } => "INVALID_ITEM_PRICE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Cannot {operation} a delivery in status {status}")]
    InvalidTransition {
        operation: DeliveryCommand,
        status: DeliveryStatus,
    },

    /// Event history does not start with a creation event.
    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error("Delivery {0} already created")]
    AlreadyCreated(super::value_objects::DeliveryId),
}

/// A stored record that no sequence of operations could have produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid stored order data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid record version: {0}")]
    InvalidVersion(i64),

    #[error("updatedAt {updated_at} precedes createdAt {created_at}")]
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },

    #[error("assignedAt is inconsistent with status {0}")]
    AssignedAtMismatch(DeliveryStatus),

    #[error("deliveredAt is inconsistent with status {0}")]
    DeliveredAtMismatch(DeliveryStatus),
}

impl DeliveryError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DeliveryError::InvalidTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_codes() {
        assert_eq!(ValidationError::MissingOrderId.code(), "MISSING_ORDER_ID");
        assert_eq!(ValidationError::InvalidCustomerId(0).code(), "INVALID_CUSTOMER_ID");
        assert_eq!(ValidationError::MissingAddress.code(), "MISSING_ADDRESS");
        assert_eq!(ValidationError::EmptyItems.code(), "EMPTY_ITEMS");
    }

    #[test]
    fn test_invalid_transition_message_names_operation_and_status() {
        let err = DeliveryError::InvalidTransition {
            operation: DeliveryCommand::MarkDelivered,
            status: DeliveryStatus::Pending,
        };
        assert_eq!(err.to_string(), "Cannot MarkDelivered a delivery in status PENDING");
        assert!(err.is_invalid_transition());
    }
}
