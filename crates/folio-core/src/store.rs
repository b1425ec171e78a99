//! Remote structured-store abstraction.
//!
//! The sync engine depends only on this interface, never on a concrete wire
//! protocol. Implementations map their transport failures onto the error
//! taxonomy: rate-limit and server-error responses become
//! [`Error::TransientRemote`] (retried by the caller), validation/auth/schema
//! refusals become [`Error::PermanentRemote`] (surfaced, not retried).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};

use crate::error::{Error, Result};

/// Collections the sync engine reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Books,
    Notes,
    Daily,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Books => write!(f, "books"),
            Self::Notes => write!(f, "notes"),
            Self::Daily => write!(f, "daily"),
        }
    }
}

/// Field set of a stored record (wire-neutral JSON object).
pub type FieldMap = Map<String, Value>;

/// One record in a remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned identifier, opaque to callers.
    pub id: String,
    pub fields: FieldMap,
}

/// Abstract query/create/update surface of the remote document store.
#[async_trait]
pub trait StructuredStore: Send + Sync {
    /// Find the record whose `key_field` equals `key_value`, if any.
    async fn find_by_key(
        &self,
        collection: Collection,
        key_field: &str,
        key_value: &Value,
    ) -> Result<Option<StoredRecord>>;

    /// Create a record and return it with its store-assigned id.
    async fn create(&self, collection: Collection, fields: FieldMap) -> Result<StoredRecord>;

    /// Update fields of an existing record; unspecified fields keep their
    /// current values.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: FieldMap,
    ) -> Result<StoredRecord>;
}

/// One recorded [`MemoryStore`] operation, for ordering assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOp {
    pub op: &'static str,
    pub collection: Collection,
}

/// In-memory [`StructuredStore`] for tests and dry runs.
///
/// Keeps each collection as a vector of records, logs every operation, and
/// can be scripted to fail upcoming writes for failure-path testing.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<StoredRecord>>>,
    next_id: AtomicU64,
    ops: Mutex<Vec<StoreOp>>,
    scripted_failures: Mutex<VecDeque<Error>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by the next write (create/update).
    /// Queued errors are consumed in FIFO order, one per write call.
    pub async fn fail_next_write(&self, error: Error) {
        self.scripted_failures.lock().await.push_back(error);
    }

    /// Snapshot of all records currently in a collection.
    pub async fn records(&self, collection: Collection) -> Vec<StoredRecord> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of records in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.records(collection).await.len()
    }

    /// Whether a collection holds no records.
    pub async fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection).await == 0
    }

    /// The operations performed so far, in call order.
    pub async fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().await.clone()
    }

    async fn log(&self, op: &'static str, collection: Collection) {
        self.ops.lock().await.push(StoreOp { op, collection });
    }

    async fn take_scripted_failure(&self) -> Option<Error> {
        self.scripted_failures.lock().await.pop_front()
    }
}

#[async_trait]
impl StructuredStore for MemoryStore {
    async fn find_by_key(
        &self,
        collection: Collection,
        key_field: &str,
        key_value: &Value,
    ) -> Result<Option<StoredRecord>> {
        self.log("find", collection).await;
        let collections = self.collections.read().await;
        let found = collections
            .get(&collection)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| record.fields.get(key_field) == Some(key_value))
            })
            .cloned();
        Ok(found)
    }

    async fn create(&self, collection: Collection, fields: FieldMap) -> Result<StoredRecord> {
        if let Some(error) = self.take_scripted_failure().await {
            return Err(error);
        }
        self.log("create", collection).await;
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = StoredRecord { id, fields };
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: FieldMap,
    ) -> Result<StoredRecord> {
        if let Some(error) = self.take_scripted_failure().await {
            return Err(error);
        }
        self.log("update", collection).await;
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|record| record.id == id))
            .ok_or_else(|| {
                Error::PermanentRemote(format!("no record {id} in {collection}"))
            })?;
        for (key, value) in fields {
            record.fields.insert(key, value);
        }
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store
            .create(Collection::Books, fields(&[("name", json!("a"))]))
            .await
            .unwrap();
        let b = store
            .create(Collection::Books, fields(&[("name", json!("b"))]))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(Collection::Books).await, 2);
    }

    #[tokio::test]
    async fn test_find_by_key_matches_field_value() {
        let store = MemoryStore::new();
        store
            .create(Collection::Books, fields(&[("name", json!("三体"))]))
            .await
            .unwrap();

        let hit = store
            .find_by_key(Collection::Books, "name", &json!("三体"))
            .await
            .unwrap();
        assert!(hit.is_some());

        let miss = store
            .find_by_key(Collection::Books, "name", &json!("missing"))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let record = store
            .create(
                Collection::Books,
                fields(&[("name", json!("三体")), ("author", json!("刘慈欣"))]),
            )
            .await
            .unwrap();

        let updated = store
            .update(
                Collection::Books,
                &record.id,
                fields(&[("cover_url", json!("https://example.com/c.jpg"))]),
            )
            .await
            .unwrap();

        assert_eq!(updated.fields["name"], json!("三体"));
        assert_eq!(updated.fields["cover_url"], json!("https://example.com/c.jpg"));
        assert_eq!(store.len(Collection::Books).await, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_permanent_error() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Notes, "rec-99", FieldMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermanentRemote(_)));
    }

    #[tokio::test]
    async fn test_scripted_failure_consumed_by_next_write() {
        let store = MemoryStore::new();
        store.fail_next_write(Error::transient("rate limited")).await;

        let err = store
            .create(Collection::Books, FieldMap::new())
            .await
            .unwrap_err();
        assert!(err.is_transient());

        // The failure was consumed; the next write succeeds.
        store.create(Collection::Books, FieldMap::new()).await.unwrap();
        assert_eq!(store.len(Collection::Books).await, 1);
    }

    #[tokio::test]
    async fn test_op_log_records_call_order() {
        let store = MemoryStore::new();
        store
            .create(Collection::Books, fields(&[("name", json!("a"))]))
            .await
            .unwrap();
        store
            .find_by_key(Collection::Notes, "fingerprint", &json!("f"))
            .await
            .unwrap();

        let ops = store.ops().await;
        assert_eq!(
            ops,
            vec![
                StoreOp { op: "create", collection: Collection::Books },
                StoreOp { op: "find", collection: Collection::Notes },
            ]
        );
    }
}
