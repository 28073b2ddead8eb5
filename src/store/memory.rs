use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DeliveryStore, StorageError};
use crate::domain::delivery::{Delivery, DeliveryId};

/// A stored document: its type tag plus the JSON payload.
struct Document {
    doc_type: String,
    payload: Vec<u8>,
}

/// In-memory backend for development and tests.
///
/// Records are kept serialized so decode failures look the same as with
/// a real database.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DeliveryId, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Store an arbitrary JSON payload under `id`, bypassing `Delivery`.
    #[cfg(test)]
    pub(crate) async fn put_raw(&self, id: DeliveryId, payload: &serde_json::Value) {
        self.documents.write().await.insert(
            id,
            Document {
                doc_type: Delivery::DOCUMENT_TYPE.to_string(),
                payload: payload.to_string().into_bytes(),
            },
        );
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn put(&self, delivery: &Delivery) -> Result<(), StorageError> {
        let payload = serde_json::to_vec(delivery)?;

        self.documents.write().await.insert(
            delivery.id(),
            Document {
                doc_type: Delivery::DOCUMENT_TYPE.to_string(),
                payload,
            },
        );

        tracing::debug!(delivery_id = %delivery.id(), "Stored delivery in memory");
        Ok(())
    }

    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError> {
        let documents = self.documents.read().await;
        documents
            .get(&id)
            .map(|doc| serde_json::from_slice(&doc.payload).map_err(StorageError::from))
            .transpose()
    }

    async fn list(&self, doc_type: &str) -> Result<Vec<Delivery>, StorageError> {
        let documents = self.documents.read().await;
        let mut deliveries = documents
            .values()
            .filter(|doc| doc.doc_type == doc_type)
            .map(|doc| serde_json::from_slice::<Delivery>(&doc.payload))
            .collect::<Result<Vec<_>, _>>()?;

        deliveries.sort_by_key(|d| (d.created_at(), d.id().as_uuid()));
        Ok(deliveries)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
