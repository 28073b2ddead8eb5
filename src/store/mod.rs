// ============================================================================
// Persistence Store
// ============================================================================
//
// Durable storage for delivery records, accessed by identifier or listed
// by document type. The lifecycle engine never sees backend details; any
// failure surfaces as a StorageError and is passed through unchanged. A
// record that fails its consistency checks on load is a Serialization error.
//
// ============================================================================

mod memory;
mod scylla_store;

use async_trait::async_trait;

use crate::domain::delivery::{Delivery, DeliveryId};

pub use memory::MemoryStore;
pub use scylla_store::ScyllaStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_serialization(&self) -> bool {
        matches!(self, StorageError::Serialization(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Insert or overwrite the record for `delivery.id()`.
    async fn put(&self, delivery: &Delivery) -> Result<(), StorageError>;

    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError>;

    /// All records of the given document type. Order is backend-defined.
    async fn list(&self, doc_type: &str) -> Result<Vec<Delivery>, StorageError>;

    fn backend_name(&self) -> &'static str;
}
