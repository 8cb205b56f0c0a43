//! In-memory record store for testing and development.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use error::StoreError;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::query::{compare, Query};
use crate::{record_id, Record, RecordStore, ID_FIELD};

/// In-memory store keyed by collection name.
///
/// Collections can be marked unavailable to simulate an outage of the
/// backing list service.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    unavailable: RwLock<HashSet<String>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            unavailable: RwLock::new(HashSet::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Insert records as-is, assigning ids to records without one.
    pub async fn seed(&self, collection: &str, records: Vec<Record>) {
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();
        for mut record in records {
            match record_id(&record) {
                Some(id) => {
                    self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    record.insert(ID_FIELD.to_string(), Value::from(id));
                }
            }
            rows.push(record);
        }
    }

    /// Make every call against `collection` fail as if the service were down.
    pub async fn mark_unavailable(&self, collection: &str) {
        self.unavailable.write().await.insert(collection.to_string());
    }

    pub async fn restore(&self, collection: &str) {
        self.unavailable.write().await.remove(collection);
    }

    /// Number of records currently held in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    async fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        if self.unavailable.read().await.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "collection {} is unavailable",
                collection
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        self.check_available(collection).await?;
        let collections = self.collections.read().await;
        let mut rows: Vec<Record> = collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            rows.sort_by(|a, b| {
                let ordering = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(size) = query.page_size {
            rows.truncate(size);
        }
        Ok(rows)
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        self.check_available(collection).await?;
        let mut new_record = record;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        new_record.insert(ID_FIELD.to_string(), Value::from(id));

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(new_record.clone());
        tracing::debug!(collection, id, "record created");
        Ok(new_record)
    }

    async fn update(&self, collection: &str, id: i64, partial: Record) -> Result<(), StoreError> {
        self.check_available(collection).await?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id,
            })?;

        for (key, value) in partial {
            if key != ID_FIELD {
                existing.insert(key, value);
            }
        }
        tracing::debug!(collection, id, "record updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<(), StoreError> {
        self.check_available(collection).await?;
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();
        let len_before = rows.len();
        rows.retain(|r| record_id(r) != Some(id));
        if rows.len() == len_before {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        }
        tracing::debug!(collection, id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Filter, OrderBy};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let created = store
            .create("Regularizations", record(json!({"EmployeeId": "E1"})))
            .await
            .unwrap();
        let id = record_id(&created).unwrap();

        let found = store.get("Regularizations", id).await.unwrap();
        assert_eq!(found["EmployeeId"], "E1");
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_id() {
        let store = InMemoryStore::new();
        let created = store
            .create("Regularizations", record(json!({"Status": "Pending", "Reason": "missed punch"})))
            .await
            .unwrap();
        let id = record_id(&created).unwrap();

        store
            .update("Regularizations", id, record(json!({"Status": "Approved", "Id": 999})))
            .await
            .unwrap();

        let found = store.get("Regularizations", id).await.unwrap();
        assert_eq!(found["Status"], "Approved");
        assert_eq!(found["Reason"], "missed punch");
        assert_eq!(record_id(&found), Some(id));
    }

    #[tokio::test]
    async fn test_list_orders_and_pages() {
        let store = InMemoryStore::new();
        store
            .seed(
                "PunchRecords",
                vec![
                    record(json!({"Date": "2025-01-03"})),
                    record(json!({"Date": "2025-01-01"})),
                    record(json!({"Date": "2025-01-02"})),
                ],
            )
            .await;

        let query = Query::new(Filter::new())
            .order_by(OrderBy::asc("Date"))
            .page_size(2);
        let rows = store.list("PunchRecords", &query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Date"], "2025-01-01");
        assert_eq!(rows[1]["Date"], "2025-01-02");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.delete("TimesheetLines", 42).await;
        assert!(matches!(result, Err(StoreError::NotFound { id: 42, .. })));
    }

    #[tokio::test]
    async fn test_unavailable_collection() {
        let store = InMemoryStore::new();
        store.mark_unavailable("Holidays").await;
        let result = store.list("Holidays", &Query::default()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        store.restore("Holidays").await;
        assert!(store.list("Holidays", &Query::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_keeps_explicit_ids() {
        let store = InMemoryStore::new();
        store
            .seed("Holidays", vec![record(json!({"Id": 10, "Title": "New Year"}))])
            .await;
        let created = store.create("Holidays", record(json!({}))).await.unwrap();
        assert_eq!(record_id(&created), Some(11));
    }
}
