//! Generic list-based record store access.
//!
//! Records are flat JSON objects keyed by column name, identified by an
//! integer `Id` column. This crate provides the [`RecordStore`] trait, an
//! in-memory implementation for development and tests, and a REST client for
//! hosted list APIs.

mod config;
mod memory;
mod query;
mod rest;

use async_trait::async_trait;
use error::StoreError;

pub use config::StoreConfig;
pub use memory::InMemoryStore;
pub use query::{compare, Condition, Filter, Op, OrderBy, Query};
pub use rest::RestListStore;

/// A single tabular record.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Name of the integer key column.
pub const ID_FIELD: &str = "Id";

/// Read the integer key of a record.
pub fn record_id(record: &Record) -> Option<i64> {
    record.get(ID_FIELD).and_then(|v| v.as_i64())
}

/// Tabular CRUD over named record collections.
///
/// Writes are single-record and last-write-wins; implementations do not
/// retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List records of a collection matching a query
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Create a record, returning it with its assigned id
    async fn create(&self, collection: &str, record: Record) -> Result<Record, StoreError>;

    /// Merge `partial` into the record with the given id
    async fn update(&self, collection: &str, id: i64, partial: Record) -> Result<(), StoreError>;

    /// Delete the record with the given id
    async fn delete(&self, collection: &str, id: i64) -> Result<(), StoreError>;

    /// Fetch one record by id
    async fn get(&self, collection: &str, id: i64) -> Result<Record, StoreError> {
        let query = Query::new(Filter::new().eq(ID_FIELD, id)).page_size(1);
        self.list(collection, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id,
            })
    }
}
