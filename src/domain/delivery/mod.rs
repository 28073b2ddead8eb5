// ============================================================================
// Delivery Domain - Lifecycle of one physical delivery
// ============================================================================
//
// - Value objects (DeliveryId, OrderItem, DeliveryStatus)
// - Events (DeliveryCreated, Assigned, PickedUp, ...)
// - Commands (CreateDelivery, DeliveryCommand)
// - Errors (ValidationError, DeliveryError)
// - Aggregate (Delivery with the transition rules)
// - Command Handler (create/assign/persist and per-id serialized transitions)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
