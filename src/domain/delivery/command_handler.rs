use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::event_sourcing::{Aggregate, DomainEvent};
use crate::metrics::Metrics;
use crate::store::{DeliveryStore, StorageError};

use super::aggregate::Delivery;
use super::commands::{CreateDelivery, DeliveryCommand};
use super::errors::{DeliveryError, ValidationError};
use super::events::DeliveryEvent;
use super::value_objects::DeliveryId;

// ============================================================================
// Delivery Command Handler
// ============================================================================
//
// Orchestrates: Request → Aggregate → Events → Store
//
// Transitions on the same delivery id are serialized here; the aggregate
// itself assumes exclusive access for the duration of one operation.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The initial Assign of a freshly created delivery was rejected.
    #[error("Assignment failed: {0}")]
    Assignment(DeliveryError),

    #[error(transparent)]
    Transition(DeliveryError),

    #[error("Delivery not found: {0}")]
    NotFound(DeliveryId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

type KeyLocks = Mutex<HashMap<DeliveryId, Arc<tokio::sync::Mutex<()>>>>;

pub struct DeliveryCommandHandler {
    store: Arc<dyn DeliveryStore>,
    metrics: Option<Arc<Metrics>>,
    locks: KeyLocks,
}

impl DeliveryCommandHandler {
    pub fn new(store: Arc<dyn DeliveryStore>) -> Self {
        Self {
            store,
            metrics: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Create a delivery, assign it and persist it.
    ///
    /// Nothing is written unless both steps succeed.
    pub async fn start_delivery(&self, request: CreateDelivery) -> Result<Delivery, CommandError> {
        let mut delivery = match Delivery::create(request) {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "Rejected delivery request");
                if let Some(m) = &self.metrics {
                    m.validation_failures.with_label_values(&[e.code()]).inc();
                }
                return Err(e.into());
            }
        };

        let events = delivery.execute(&DeliveryCommand::Assign).map_err(|e| {
            tracing::error!(delivery_id = %delivery.id(), error = %e, "Initial assignment failed");
            CommandError::Assignment(e)
        })?;

        self.persist(&delivery, "put").await?;
        self.record(&delivery, &events);

        if let Some(m) = &self.metrics {
            m.deliveries_created.inc();
        }

        tracing::info!(
            delivery_id = %delivery.id(),
            order_id = %delivery.order_id(),
            customer_id = delivery.customer_id(),
            total = delivery.calculate_total(),
            "✅ Delivery started"
        );

        Ok(delivery)
    }

    /// Apply one lifecycle command to a stored delivery.
    pub async fn handle(
        &self,
        id: DeliveryId,
        command: DeliveryCommand,
    ) -> Result<Delivery, CommandError> {
        let key = self.key_lock(id);
        let _guard = key.mutex().lock().await;
        self.handle_locked(id, command).await
    }

    async fn handle_locked(
        &self,
        id: DeliveryId,
        command: DeliveryCommand,
    ) -> Result<Delivery, CommandError> {
        let mut delivery = self.load(id).await?;

        let events = match delivery.execute(&command) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    delivery_id = %id,
                    operation = %command,
                    status = %delivery.status(),
                    terminal = delivery.status().is_terminal(),
                    "Rejected transition"
                );
                if let Some(m) = &self.metrics {
                    m.transitions_rejected
                        .with_label_values(&[command.as_str(), delivery.status().as_str()])
                        .inc();
                }
                return Err(CommandError::Transition(e));
            }
        };

        self.persist(&delivery, "put").await?;
        self.record(&delivery, &events);

        Ok(delivery)
    }

    pub async fn get(&self, id: DeliveryId) -> Result<Delivery, CommandError> {
        self.load(id).await
    }

    pub async fn list(&self) -> Result<Vec<Delivery>, CommandError> {
        self.store
            .list(Delivery::DOCUMENT_TYPE)
            .await
            .map_err(|e| self.store_failure("list", e))
    }

    async fn load(&self, id: DeliveryId) -> Result<Delivery, CommandError> {
        self.store
            .get(id)
            .await
            .map_err(|e| self.store_failure("get", e))?
            .ok_or(CommandError::NotFound(id))
    }

    async fn persist(&self, delivery: &Delivery, operation: &'static str) -> Result<(), CommandError> {
        self.store
            .put(delivery)
            .await
            .map_err(|e| self.store_failure(operation, e))
    }

    fn store_failure(&self, operation: &'static str, err: StorageError) -> CommandError {
        tracing::error!(
            backend = self.store.backend_name(),
            operation = operation,
            error = %err,
            "Store operation failed"
        );
        if let Some(m) = &self.metrics {
            m.store_errors.with_label_values(&[operation]).inc();
        }
        CommandError::Storage(err)
    }

    fn record(&self, delivery: &Delivery, events: &[DeliveryEvent]) {
        for event in events {
            tracing::info!(
                delivery_id = %delivery.id(),
                event_type = event.event_type(),
                status = %delivery.status(),
                version = delivery.version(),
                "Applied delivery event"
            );
            if let Some(m) = &self.metrics {
                m.transitions.with_label_values(&[event.event_type()]).inc();
            }
        }
    }

    fn key_lock(&self, id: DeliveryId) -> KeyLock<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        KeyLock {
            locks: &self.locks,
            id,
            mutex: locks.entry(id).or_default().clone(),
        }
    }
}

/// Handle on one per-id lock. Dropping it removes the map entry once no
/// other caller holds it, including when the owning future is cancelled.
struct KeyLock<'a> {
    locks: &'a KeyLocks,
    id: DeliveryId,
    mutex: Arc<tokio::sync::Mutex<()>>,
}

impl KeyLock<'_> {
    fn mutex(&self) -> &tokio::sync::Mutex<()> {
        &self.mutex
    }
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this handle own it.
        if Arc::strong_count(&self.mutex) == 2 {
            locks.remove(&self.id);
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::{DeliveryStatus, OrderItem};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_test_request() -> CreateDelivery {
        CreateDelivery {
            order_id: "order-123".to_string(),
            customer_id: 456,
            address: "Test Address 123".to_string(),
            items: vec![OrderItem {
                product_id: 1,
                product_name: "Test Product".to_string(),
                quantity: 2,
                unit_price: 25.99,
            }],
        }
    }

    /// Wraps a MemoryStore, counting writes and optionally failing them.
    #[derive(Default)]
    struct ProbeStore {
        inner: MemoryStore,
        puts: AtomicUsize,
        fail_puts: bool,
    }

    #[async_trait]
    impl DeliveryStore for ProbeStore {
        async fn put(&self, delivery: &Delivery) -> Result<(), StorageError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail_puts {
                return Err(StorageError::Backend("bucket not ready".to_string()));
            }
            self.inner.put(delivery).await
        }

        async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError> {
            self.inner.get(id).await
        }

        async fn list(&self, doc_type: &str) -> Result<Vec<Delivery>, StorageError> {
            self.inner.list(doc_type).await
        }

        fn backend_name(&self) -> &'static str {
            "probe"
        }
    }

    fn handler_with(store: Arc<ProbeStore>) -> DeliveryCommandHandler {
        DeliveryCommandHandler::new(store).with_metrics(Arc::new(Metrics::new().unwrap()))
    }

    #[tokio::test]
    async fn test_start_delivery_assigns_and_persists() {
        let store = Arc::new(ProbeStore::default());
        let handler = handler_with(store.clone());

        let delivery = handler.start_delivery(create_test_request()).await.unwrap();

        assert_eq!(delivery.status(), DeliveryStatus::Assigned);
        assert!(delivery.assigned_at().is_some());
        assert_eq!(delivery.calculate_total(), 51.98);
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);

        let stored = handler.get(delivery.id()).await.unwrap();
        assert_eq!(stored, delivery);
    }

    #[tokio::test]
    async fn test_validation_failure_never_touches_store() {
        let store = Arc::new(ProbeStore::default());
        let handler = handler_with(store.clone());

        let mut request = create_test_request();
        request.order_id = String::new();

        let err = handler.start_delivery(request).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(ValidationError::MissingOrderId)));
        assert_eq!(store.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_passes_through() {
        let store = Arc::new(ProbeStore {
            fail_puts: true,
            ..Default::default()
        });
        let handler = handler_with(store.clone());

        let err = handler.start_delivery(create_test_request()).await.unwrap_err();
        match err {
            CommandError::Storage(StorageError::Backend(msg)) => assert_eq!(msg, "bucket not ready"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_full_lifecycle_through_handler() {
        let handler = handler_with(Arc::new(ProbeStore::default()));
        let id = handler.start_delivery(create_test_request()).await.unwrap().id();

        handler.handle(id, DeliveryCommand::MarkPickedUp).await.unwrap();
        handler.handle(id, DeliveryCommand::MarkInTransit).await.unwrap();
        let delivered = handler.handle(id, DeliveryCommand::MarkDelivered).await.unwrap();

        assert_eq!(delivered.status(), DeliveryStatus::Delivered);
        assert!(delivered.delivered_at().unwrap() >= delivered.assigned_at().unwrap());
        assert_eq!(handler.get(id).await.unwrap(), delivered);
        assert!(handler.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_transition_does_not_write() {
        let store = Arc::new(ProbeStore::default());
        let handler = handler_with(store.clone());
        let id = handler.start_delivery(create_test_request()).await.unwrap().id();
        let before = handler.get(id).await.unwrap();

        let err = handler.handle(id, DeliveryCommand::MarkDelivered).await.unwrap_err();
        assert!(matches!(
            err,
            CommandError::Transition(DeliveryError::InvalidTransition {
                operation: DeliveryCommand::MarkDelivered,
                status: DeliveryStatus::Assigned,
            })
        ));
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
        assert_eq!(handler.get(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_cancelled_request_releases_its_lock() {
        let handler = handler_with(Arc::new(ProbeStore::default()));
        let id = handler.start_delivery(create_test_request()).await.unwrap().id();

        let held = handler.key_lock(id);
        let guard = held.mutex().lock().await;

        let waiting = handler.handle(id, DeliveryCommand::MarkPickedUp);
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), waiting).await;
        assert!(timed_out.is_err());
        assert_eq!(handler.locks.lock().unwrap().len(), 1);

        drop(guard);
        drop(held);
        assert!(handler.locks.lock().unwrap().is_empty());
        assert_eq!(handler.get(id).await.unwrap().status(), DeliveryStatus::Assigned);
    }

    #[tokio::test]
    async fn test_inconsistent_stored_record_is_not_transitioned() {
        let store = Arc::new(ProbeStore::default());
        let handler = handler_with(store.clone());
        let delivery = handler.start_delivery(create_test_request()).await.unwrap();
        let id = delivery.id();

        // Rewrite the stored record as PENDING with an empty order and a deliveredAt.
        let mut record = serde_json::to_value(&delivery).unwrap();
        record["status"] = serde_json::json!("PENDING");
        record["items"] = serde_json::json!([]);
        record["deliveredAt"] = record["updatedAt"].clone();
        store.inner.put_raw(id, &record).await;

        let err = handler.handle(id, DeliveryCommand::Assign).await.unwrap_err();
        assert!(matches!(err, CommandError::Storage(ref e) if e.is_serialization()));
        assert!(matches!(handler.get(id).await, Err(CommandError::Storage(_))));
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_delivery() {
        let handler = handler_with(Arc::new(ProbeStore::default()));
        let id = DeliveryId::new();

        assert!(matches!(handler.get(id).await, Err(CommandError::NotFound(x)) if x == id));
        assert!(matches!(
            handler.handle(id, DeliveryCommand::Cancel).await,
            Err(CommandError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_returns_started_deliveries() {
        let handler = handler_with(Arc::new(ProbeStore::default()));
        handler.start_delivery(create_test_request()).await.unwrap();
        handler.start_delivery(create_test_request()).await.unwrap();

        assert_eq!(handler.list().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_on_same_delivery_are_serialized() {
        let handler = Arc::new(handler_with(Arc::new(ProbeStore::default())));
        let id = handler.start_delivery(create_test_request()).await.unwrap().id();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move { handler.handle(id, DeliveryCommand::Cancel).await })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1);
        let stored = handler.get(id).await.unwrap();
        assert_eq!(stored.status(), DeliveryStatus::Cancelled);
        assert_eq!(stored.version(), 3);
    }
}
