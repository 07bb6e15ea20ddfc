// src/storage/local.rs

//! Local filesystem storage backend.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ContentRecord;
use crate::storage::{RecordStorage, Snapshot, WriteReport};

/// Writes run snapshots to a single JSON file.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a storage backend writing to the given snapshot path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the snapshot file, returning None if it doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl RecordStorage for LocalStorage {
    async fn write_snapshot(&self, records: Vec<ContentRecord>) -> Result<WriteReport> {
        let snapshot = Snapshot::new(records);
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        self.write_bytes(&bytes).await?;

        Ok(WriteReport {
            count: snapshot.count,
            location: self.path.display().to_string(),
        })
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::SourceType;

    fn record(url: &str) -> ContentRecord {
        ContentRecord {
            company: "Ringle".to_string(),
            source_type: SourceType::Blog,
            source_platform: "Naver Blog".to_string(),
            title: "title".to_string(),
            text: "body text".to_string(),
            rating: None,
            author: "writer".to_string(),
            date: String::new(),
            url: url.to_string(),
            collected_at: Utc::now(),
            search_keyword: Some("kw".to_string()),
        }
    }

    #[tokio::test]
    async fn snapshot_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("records.json"));

        let report = storage
            .write_snapshot(vec![
                record("https://example.com/1"),
                record("https://example.com/2"),
            ])
            .await
            .unwrap();
        assert_eq!(report.count, 2);

        let snapshot = storage.load_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.records[0].url, "https://example.com/1");
    }

    #[tokio::test]
    async fn missing_snapshot_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("records.json"));
        assert!(storage.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rewrite_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("records.json"));

        storage
            .write_snapshot(vec![record("https://example.com/1")])
            .await
            .unwrap();
        storage.write_snapshot(vec![]).await.unwrap();

        let snapshot = storage.load_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.count, 0);
        assert!(snapshot.records.is_empty());
    }
}
