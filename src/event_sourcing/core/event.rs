use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Generic domain event.
///
/// `event_type` names the concrete variant, used as a log field and as a
/// metrics label.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;

    fn event_version(&self) -> i32 {
        1
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", content = "data")]
    enum TestEvent {
        Opened { by: String },
        Closed,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Opened { .. } => "TestOpened",
                TestEvent::Closed => "TestClosed",
            }
        }
    }

    #[test]
    fn test_event_type_per_variant() {
        let opened = TestEvent::Opened { by: "courier".to_string() };
        assert_eq!(opened.event_type(), "TestOpened");
        assert_eq!(TestEvent::Closed.event_type(), "TestClosed");
        assert_eq!(opened.event_version(), 1);
    }
}
