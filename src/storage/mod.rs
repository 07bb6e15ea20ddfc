// src/storage/mod.rs

//! Storage abstractions for harvested records.
//!
//! The orchestrator performs one terminal write per run. Snapshots are
//! written atomically (temp file, then rename) so a cancelled or crashed
//! run never leaves a partially-written snapshot behind.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ContentRecord;

// Re-export for convenience
pub use local::LocalStorage;

/// A run's worth of records plus write metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When this snapshot was written
    pub updated_at: DateTime<Utc>,

    /// Total record count
    pub count: usize,

    /// The records array
    pub records: Vec<ContentRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: records.len(),
            records,
        }
    }
}

/// Metadata about a completed snapshot write.
#[derive(Debug, Clone)]
pub struct WriteReport {
    /// Number of records written
    pub count: usize,

    /// Where the snapshot landed
    pub location: String,
}

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Write all records of a run as one snapshot.
    async fn write_snapshot(&self, records: Vec<ContentRecord>) -> Result<WriteReport>;

    /// Load the last written snapshot, if any.
    async fn load_snapshot(&self) -> Result<Option<Snapshot>>;
}
