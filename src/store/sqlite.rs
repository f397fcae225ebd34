//! SQLite-backed [`RecordStore`].
//!
//! Equality lookups on `title`, `filename`, and `source_url` are served by
//! the indexes created in [`crate::migrate`]. `description` is unindexed and
//! filtered by scan.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::RecordStore;
use crate::config::Config;
use crate::models::{NewRecord, Record, RecordQuery};
use crate::{db, migrate};

const SELECT_COLUMNS: &str = "SELECT id, title, description, filename, source_url FROM records";

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wraps an open pool. The schema must already exist.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `[db].path` and creates the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(&config.db).await?;
        migrate::create_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_record(row: &SqliteRow) -> Record {
    Record {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        filename: row.get("filename"),
        source_url: row.get("source_url"),
    }
}

/// Builds the SQL for a first-match lookup. Column names come from a fixed
/// list in [`RecordQuery::predicates`]; values are always bound.
fn first_match_sql(query: &RecordQuery) -> String {
    let predicates = query.predicates();
    if predicates.is_empty() {
        return format!("{} ORDER BY id ASC LIMIT 1", SELECT_COLUMNS);
    }
    let clauses: Vec<String> = predicates
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect();
    format!(
        "{} WHERE {} ORDER BY id ASC LIMIT 1",
        SELECT_COLUMNS,
        clauses.join(" AND ")
    )
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &NewRecord) -> Result<Record> {
        let result = sqlx::query(
            "INSERT INTO records (title, description, filename, source_url) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.filename)
        .bind(&record.source_url)
        .execute(&self.pool)
        .await?;

        Ok(record.clone().with_id(result.last_insert_rowid()))
    }

    async fn all(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn find_first(&self, query: &RecordQuery) -> Result<Option<Record>> {
        let sql = first_match_sql(query);
        let mut q = sqlx::query(&sql);
        for (_, value) in query.predicates() {
            q = q.bind(value);
        }
        let row = q.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
