//! Record storage abstraction.
//!
//! The [`RecordStore`] trait is the only way the ingestion loop and the
//! query service touch persisted records, so both can run against SQLite in
//! production and [`InMemoryRecordStore`] in tests.
//!
//! Implementations must be `Send + Sync`: ingestion workers insert while the
//! HTTP handlers read, and no lock is taken above the store itself.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewRecord, Record, RecordQuery};

/// Abstract record store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](RecordStore::insert) | Insert a record and assign it the next id |
/// | [`all`](RecordStore::all) | Every record, ordered by id |
/// | [`find_first`](RecordStore::find_first) | Lowest-id record matching a [`RecordQuery`] |
/// | [`count`](RecordStore::count) | Number of stored records |
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record. No deduplication is performed: identical input
    /// produces a second row with a new id.
    async fn insert(&self, record: &NewRecord) -> Result<Record>;

    async fn all(&self) -> Result<Vec<Record>>;

    /// First record (by id) satisfying every predicate in `query`.
    async fn find_first(&self, query: &RecordQuery) -> Result<Option<Record>>;

    async fn count(&self) -> Result<i64>;
}
