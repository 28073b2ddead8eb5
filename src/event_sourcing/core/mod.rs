// ============================================================================
// Event Sourcing Core - Generic Abstractions
// ============================================================================
//
// Key Principles:
// - No domain-specific code (no Delivery, Order, etc.)
// - Generic over aggregate types
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::Aggregate;
pub use event::DomainEvent;
