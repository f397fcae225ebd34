//! Record dumps as JSON.
//!
//! The same payload backs `GET /` (which also rewrites the results file)
//! and `gallery export`.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::models::Record;
use crate::store::RecordStore;

/// Serializes records exactly as the HTTP API returns them.
pub fn records_json(records: &[Record]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(records)?)
}

/// Writes `payload` to `path`, replacing any previous contents.
pub async fn write_results(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, payload)
        .await
        .with_context(|| format!("writing results file {}", path.display()))
}

/// Dumps every stored record to `output`, or to stdout when `None`.
pub async fn run_export(store: Arc<dyn RecordStore>, output: Option<&Path>) -> Result<()> {
    let records = store.all().await?;
    let payload = records_json(&records)?;

    match output {
        Some(path) => {
            write_results(path, &payload).await?;
            eprintln!("Exported {} records to {}", records.len(), path.display());
        }
        None => {
            println!("{}", String::from_utf8_lossy(&payload));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRecord;
    use crate::store::InMemoryRecordStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_to_file() {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .insert(&NewRecord::new(
                "Dunes".into(),
                "sand".into(),
                "https://cdn/x/dunes.jpg".into(),
            ))
            .await
            .unwrap();

        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested/results.json");
        run_export(store, Some(&out)).await.unwrap();

        let parsed: Vec<Record> =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].filename, "dunes.jpg");
    }

    #[test]
    fn test_empty_dump_is_empty_array() {
        assert_eq!(records_json(&[]).unwrap(), b"[]");
    }
}
