// Private module declaration
mod server;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub use server::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Delivery creation
// - Accepted and rejected lifecycle transitions
// - Validation failures by reason code
// - Persistence store errors
//
// Scraped via GET /metrics on the API server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub deliveries_created: IntCounter,
    pub transitions: IntCounterVec,
    pub transitions_rejected: IntCounterVec,
    pub validation_failures: IntCounterVec,
    pub store_errors: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let deliveries_created = IntCounter::new(
            "deliveries_created_total",
            "Total deliveries created and persisted",
        )?;
        registry.register(Box::new(deliveries_created.clone()))?;

        let transitions = IntCounterVec::new(
            Opts::new("delivery_transitions_total", "Lifecycle events applied"),
            &["event_type"],
        )?;
        registry.register(Box::new(transitions.clone()))?;

        let transitions_rejected = IntCounterVec::new(
            Opts::new(
                "delivery_transitions_rejected_total",
                "Transitions rejected because of the current status",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(transitions_rejected.clone()))?;

        let validation_failures = IntCounterVec::new(
            Opts::new(
                "delivery_validation_failures_total",
                "Creation requests rejected by validation",
            ),
            &["code"],
        )?;
        registry.register(Box::new(validation_failures.clone()))?;

        let store_errors = IntCounterVec::new(
            Opts::new("delivery_store_errors_total", "Persistence store failures"),
            &["operation"],
        )?;
        registry.register(Box::new(store_errors.clone()))?;

        Ok(Self {
            registry,
            deliveries_created,
            transitions,
            transitions_rejected,
            validation_failures,
            store_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
