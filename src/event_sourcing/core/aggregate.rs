use super::event::DomainEvent;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Key Principles:
// 1. Commands are validated against current state and produce events
// 2. Events are facts; applying one is the only way state changes
// 3. Validation never mutates, so a rejected command leaves state untouched
// 4. Events carry their own timestamps, so replaying them is deterministic
//
// ============================================================================

/// Generic aggregate trait shared by every lifecycle-driven entity.
///
/// Type Parameters:
/// - `Event`: the domain event type for this aggregate
/// - `Command`: the command type for this aggregate
/// - `Error`: the error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Id: Copy + std::fmt::Display;
    type Event: DomainEvent;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic, no mutation)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Self::Id;

    /// Number of events applied so far
    fn version(&self) -> i64;

    /// Validate a command and apply the events it yields.
    ///
    /// Returns the applied events so callers can log or publish them.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;
        for event in &events {
            self.apply_event(event)?;
        }
        Ok(events)
    }

    /// Rebuild an aggregate from its event history.
    ///
    /// Returns `Ok(None)` for an empty history.
    fn load_from_events<'a, I>(events: I) -> Result<Option<Self>, Self::Error>
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        let mut events = events.into_iter();
        let Some(first) = events.next() else {
            return Ok(None);
        };

        let mut aggregate = Self::apply_first_event(first)?;
        for event in events {
            aggregate.apply_event(event)?;
        }

        Ok(Some(aggregate))
    }
}
