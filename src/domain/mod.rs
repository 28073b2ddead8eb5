// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with value objects, events,
// commands, errors, the aggregate implementation and its command handler.
//
// This layer performs no I/O itself; persistence goes through the
// store::DeliveryStore trait.
//
// ============================================================================

pub mod delivery;
