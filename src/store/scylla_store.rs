use async_trait::async_trait;
use chrono::Utc;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use uuid::Uuid;

use super::{DeliveryStore, StorageError};
use crate::domain::delivery::{Delivery, DeliveryId};

// ============================================================================
// ScyllaDB Backend
// ============================================================================
//
// One row per delivery, payload stored as JSON text:
//
//   deliveries (id uuid PRIMARY KEY, doc_type text, payload text, updated_at timestamp)
//
// ============================================================================

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS deliveries (
    id uuid PRIMARY KEY,
    doc_type text,
    payload text,
    updated_at timestamp
)";

const INSERT_DELIVERY: &str =
    "INSERT INTO deliveries (id, doc_type, payload, updated_at) VALUES (?, ?, ?, ?)";

const SELECT_BY_ID: &str = "SELECT payload FROM deliveries WHERE id = ?";

const SELECT_BY_TYPE: &str = "SELECT payload FROM deliveries WHERE doc_type = ? ALLOW FILTERING";

pub struct ScyllaStore {
    session: Session,
}

fn backend<E: std::fmt::Display>(err: E) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Keyspace names are interpolated into CQL, so only identifiers are accepted.
fn is_valid_keyspace(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 48
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

impl ScyllaStore {
    /// Connect to `node`, creating the keyspace and table when missing.
    pub async fn connect(node: &str, keyspace: &str) -> Result<Self, StorageError> {
        if !is_valid_keyspace(keyspace) {
            return Err(StorageError::Backend(format!("invalid keyspace name: {keyspace}")));
        }

        tracing::info!(node = %node, keyspace = %keyspace, "Connecting to ScyllaDB");
        let session = SessionBuilder::new()
            .known_node(node)
            .build()
            .await
            .map_err(backend)?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
                ),
                &[],
            )
            .await
            .map_err(backend)?;

        session.use_keyspace(keyspace, false).await.map_err(backend)?;

        session
            .query_unpaged(CREATE_TABLE, &[])
            .await
            .map_err(backend)?;

        tracing::info!(keyspace = %keyspace, "ScyllaDB store ready");
        Ok(Self { session })
    }

    async fn select_payloads<V>(&self, query: &str, values: V) -> Result<Vec<String>, StorageError>
    where
        V: scylla::serialize::row::SerializeRow,
    {
        let result = self
            .session
            .query_unpaged(query, values)
            .await
            .map_err(backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };

        let mut payloads = Vec::new();
        for row in rows_result.rows::<(String,)>().map_err(backend)? {
            let (payload,) = row.map_err(backend)?;
            payloads.push(payload);
        }
        Ok(payloads)
    }
}

#[async_trait]
impl DeliveryStore for ScyllaStore {
    async fn put(&self, delivery: &Delivery) -> Result<(), StorageError> {
        let payload = serde_json::to_string(delivery)?;

        self.session
            .query_unpaged(
                INSERT_DELIVERY,
                (
                    delivery.id().as_uuid(),
                    Delivery::DOCUMENT_TYPE,
                    payload,
                    Utc::now(),
                ),
            )
            .await
            .map_err(backend)?;

        tracing::debug!(
            delivery_id = %delivery.id(),
            status = %delivery.status(),
            "Persisted delivery to ScyllaDB"
        );
        Ok(())
    }

    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError> {
        let uuid: Uuid = id.as_uuid();
        let payloads = self.select_payloads(SELECT_BY_ID, (uuid,)).await?;

        match payloads.first() {
            Some(payload) => Ok(Some(serde_json::from_str(payload)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, doc_type: &str) -> Result<Vec<Delivery>, StorageError> {
        let payloads = self.select_payloads(SELECT_BY_TYPE, (doc_type,)).await?;

        let deliveries = payloads
            .iter()
            .map(|payload| serde_json::from_str::<Delivery>(payload))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(doc_type = %doc_type, count = deliveries.len(), "Listed deliveries");
        Ok(deliveries)
    }

    fn backend_name(&self) -> &'static str {
        "scylla"
    }
}

// Operations against a live cluster need integration tests; only the pure
// helpers are covered here.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_name_validation() {
        assert!(is_valid_keyspace("deliveries_ks"));
        assert!(!is_valid_keyspace(""));
        assert!(!is_valid_keyspace("1deliveries"));
        assert!(!is_valid_keyspace("ks; DROP TABLE deliveries"));
        assert!(!is_valid_keyspace(&"k".repeat(49)));
    }

    #[test]
    fn test_backend_error_mapping() {
        let err = backend("connection refused");
        assert!(matches!(err, StorageError::Backend(ref msg) if msg == "connection refused"));
        assert!(!err.is_serialization());
    }
}
