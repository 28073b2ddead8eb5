use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event_sourcing::Aggregate;
use super::commands::{CreateDelivery, DeliveryCommand};
use super::errors::{DeliveryError, RecordError, ValidationError};
use super::events::{DeliveryCreated, DeliveryEvent};
use super::value_objects::{DeliveryId, DeliveryStatus, OrderItem};

// ============================================================================
// Delivery Aggregate - Lifecycle State Machine
// ============================================================================
//
//   PENDING ──Assign──> ASSIGNED ──MarkPickedUp──> PICKED_UP
//      │                   │                           │
//      └──Cancel──┐  ┌─Cancel┘                 MarkInTransit
//                 v  v                                 v
//              CANCELLED      DELIVERED <─MarkDelivered─ IN_TRANSIT
//
// FAILED is representable but no command leads to it.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DeliveryRecord")]
pub struct Delivery {
    // Identity
    id: DeliveryId,
    version: i64,

    // Immutable order data
    order_id: String,
    customer_id: i64,
    address: String,
    items: Vec<OrderItem>,

    status: DeliveryStatus,

    // Audit Trail
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivered_at: Option<DateTime<Utc>>,
}

/// Stored shape of a delivery, checked before it becomes a `Delivery`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryRecord {
    id: DeliveryId,
    version: i64,
    order_id: String,
    customer_id: i64,
    address: String,
    items: Vec<OrderItem>,
    status: DeliveryStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<DeliveryRecord> for Delivery {
    type Error = RecordError;

    fn try_from(r: DeliveryRecord) -> Result<Self, Self::Error> {
        validate_order(&r.order_id, r.customer_id, &r.address, &r.items)?;

        if r.version < 1 {
            return Err(RecordError::InvalidVersion(r.version));
        }
        if r.updated_at < r.created_at {
            return Err(RecordError::UpdatedBeforeCreated {
                created_at: r.created_at,
                updated_at: r.updated_at,
            });
        }

        // Every status past ASSIGNED went through Assign; CANCELLED may or may not have.
        let assigned_ok = match r.status {
            DeliveryStatus::Pending => r.assigned_at.is_none(),
            DeliveryStatus::Assigned
            | DeliveryStatus::PickedUp
            | DeliveryStatus::InTransit
            | DeliveryStatus::Delivered => r.assigned_at.is_some(),
            DeliveryStatus::Cancelled | DeliveryStatus::Failed => true,
        };
        let delivered_ok = r.delivered_at.is_some() == (r.status == DeliveryStatus::Delivered);
        let in_window = |at: Option<DateTime<Utc>>| {
            !at.is_some_and(|at| at < r.created_at || at > r.updated_at)
        };

        if !assigned_ok || !in_window(r.assigned_at) {
            return Err(RecordError::AssignedAtMismatch(r.status));
        }
        if !delivered_ok || !in_window(r.delivered_at) {
            return Err(RecordError::DeliveredAtMismatch(r.status));
        }

        Ok(Self {
            id: r.id,
            version: r.version,
            order_id: r.order_id,
            customer_id: r.customer_id,
            address: r.address,
            items: r.items,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            assigned_at: r.assigned_at,
            delivered_at: r.delivered_at,
        })
    }
}

/// Status reached by applying `command` in `from`, or `None` if the pair is illegal.
pub fn next_status(command: DeliveryCommand, from: DeliveryStatus) -> Option<DeliveryStatus> {
    use DeliveryCommand as C;
    use DeliveryStatus as S;

    match (command, from) {
        (C::Assign, S::Pending) => Some(S::Assigned),
        (C::MarkPickedUp, S::Assigned) => Some(S::PickedUp),
        (C::MarkInTransit, S::PickedUp) => Some(S::InTransit),
        (C::MarkDelivered, S::InTransit) => Some(S::Delivered),
        (C::Cancel, S::Pending | S::Assigned) => Some(S::Cancelled),
        _ => None,
    }
}

/// Check a creation request. Order: orderId, customerId, address, items.
pub fn validate_request(request: &CreateDelivery) -> Result<(), ValidationError> {
    validate_order(
        &request.order_id,
        request.customer_id,
        &request.address,
        &request.items,
    )
}

fn validate_order(
    order_id: &str,
    customer_id: i64,
    address: &str,
    items: &[OrderItem],
) -> Result<(), ValidationError> {
    if order_id.trim().is_empty() {
        return Err(ValidationError::MissingOrderId);
    }
    if customer_id <= 0 {
        return Err(ValidationError::InvalidCustomerId(customer_id));
    }
    if address.trim().is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    if items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    for (index, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ValidationError::InvalidItemQuantity {
                index,
                quantity: item.quantity,
            });
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(ValidationError::InvalidItemPrice {
                index,
                unit_price: item.unit_price,
            });
        }
    }

    Ok(())
}

/// Sum of `quantity * unit_price`. Empty input yields zero.
pub fn calculate_total(items: &[OrderItem]) -> f64 {
    items.iter().map(OrderItem::line_total).sum()
}

impl Delivery {
    /// Document type used by the persistence store.
    pub const DOCUMENT_TYPE: &'static str = "delivery";

    /// Validate the request and build a PENDING delivery with a fresh id.
    pub fn create(request: CreateDelivery) -> Result<Self, ValidationError> {
        Self::create_at(request, Utc::now())
    }

    pub fn create_at(request: CreateDelivery, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        validate_request(&request)?;

        Ok(Self::from_created(&DeliveryCreated {
            delivery_id: DeliveryId::new(),
            order_id: request.order_id,
            customer_id: request.customer_id,
            address: request.address,
            items: request.items,
            created_at: now,
        }))
    }

    fn from_created(e: &DeliveryCreated) -> Self {
        Self {
            id: e.delivery_id,
            version: 1,
            order_id: e.order_id.clone(),
            customer_id: e.customer_id,
            address: e.address.clone(),
            items: e.items.clone(),
            status: DeliveryStatus::Pending,
            created_at: e.created_at,
            updated_at: e.created_at,
            assigned_at: None,
            delivered_at: None,
        }
    }

    pub fn id(&self) -> DeliveryId {
        self.id
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn customer_id(&self) -> i64 {
        self.customer_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn calculate_total(&self) -> f64 {
        calculate_total(&self.items)
    }

    pub fn can(&self, command: DeliveryCommand) -> bool {
        next_status(command, self.status).is_some()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    pub fn assign(&mut self) -> Result<(), DeliveryError> {
        self.transition(DeliveryCommand::Assign)
    }

    pub fn mark_picked_up(&mut self) -> Result<(), DeliveryError> {
        self.transition(DeliveryCommand::MarkPickedUp)
    }

    pub fn mark_in_transit(&mut self) -> Result<(), DeliveryError> {
        self.transition(DeliveryCommand::MarkInTransit)
    }

    pub fn mark_delivered(&mut self) -> Result<(), DeliveryError> {
        self.transition(DeliveryCommand::MarkDelivered)
    }

    pub fn cancel(&mut self) -> Result<(), DeliveryError> {
        self.transition(DeliveryCommand::Cancel)
    }

    pub fn transition(&mut self, command: DeliveryCommand) -> Result<(), DeliveryError> {
        self.execute(&command).map(|_| ())
    }

    /// Run `command` with an explicit clock reading.
    pub fn transition_at(
        &mut self,
        command: DeliveryCommand,
        now: DateTime<Utc>,
    ) -> Result<DeliveryEvent, DeliveryError> {
        let event = self.decide(command, now)?;
        self.apply_event(&event)?;
        Ok(event)
    }

    /// Guard check. Produces the event for `command` without touching state.
    fn decide(&self, command: DeliveryCommand, now: DateTime<Utc>) -> Result<DeliveryEvent, DeliveryError> {
        if !self.can(command) {
            return Err(DeliveryError::InvalidTransition {
                operation: command,
                status: self.status,
            });
        }

        // A clock stepping backwards must not break updated_at >= created_at.
        let at = now.max(self.updated_at);

        Ok(match command {
            DeliveryCommand::Assign => DeliveryEvent::Assigned { assigned_at: at },
            DeliveryCommand::MarkPickedUp => DeliveryEvent::PickedUp { picked_up_at: at },
            DeliveryCommand::MarkInTransit => DeliveryEvent::InTransit { departed_at: at },
            DeliveryCommand::MarkDelivered => DeliveryEvent::Delivered { delivered_at: at },
            DeliveryCommand::Cancel => DeliveryEvent::Cancelled { cancelled_at: at },
        })
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Delivery {
    type Id = DeliveryId;
    type Event = DeliveryEvent;
    type Command = DeliveryCommand;
    type Error = DeliveryError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            DeliveryEvent::Created(e) => Ok(Self::from_created(e)),
            _ => Err(DeliveryError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        let command = match event {
            DeliveryEvent::Created(_) => return Err(DeliveryError::AlreadyCreated(self.id)),
            DeliveryEvent::Assigned { .. } => DeliveryCommand::Assign,
            DeliveryEvent::PickedUp { .. } => DeliveryCommand::MarkPickedUp,
            DeliveryEvent::InTransit { .. } => DeliveryCommand::MarkInTransit,
            DeliveryEvent::Delivered { .. } => DeliveryCommand::MarkDelivered,
            DeliveryEvent::Cancelled { .. } => DeliveryCommand::Cancel,
        };

        let next = next_status(command, self.status).ok_or(DeliveryError::InvalidTransition {
            operation: command,
            status: self.status,
        })?;

        let at = event.occurred_at();
        match event {
            DeliveryEvent::Assigned { .. } => self.assigned_at = Some(at),
            DeliveryEvent::Delivered { .. } => self.delivered_at = Some(at),
            _ => {}
        }
        self.status = next;
        self.updated_at = at.max(self.updated_at);
        self.version += 1;

        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        Ok(vec![self.decide(*command, Utc::now())?])
    }

    fn aggregate_id(&self) -> DeliveryId {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
