//! In-memory [`RecordStore`] for tests.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::RecordStore;
use crate::models::{NewRecord, Record, RecordQuery};

/// Vec-backed store. Ids start at 1 and are assigned under the write lock.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: &NewRecord) -> Result<Record> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        let id = records.last().map(|r| r.id).unwrap_or(0) + 1;
        let stored = record.clone().with_id(id);
        records.push(stored.clone());
        Ok(stored)
    }

    async fn all(&self) -> Result<Vec<Record>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(records.clone())
    }

    async fn find_first(&self, query: &RecordQuery) -> Result<Option<Record>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(records.iter().find(|r| query.matches(r)).cloned())
    }

    async fn count(&self) -> Result<i64> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(records.len() as i64)
    }
}
