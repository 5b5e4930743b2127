//! Usage ledger - where finalized purchase lists are recorded
//!
//! Every append is a new record; recording the same list twice yields two
//! entries.

use crate::error::{InventoryError, InventoryResult};
use crate::kit::KitItem;
use crate::reconcile::ReconciliationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub items: Vec<KitItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReconciliationReport>,
}

impl UsageRecord {
    pub fn new(items: Vec<KitItem>, report: Option<ReconciliationReport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            items,
            report,
        }
    }
}

#[async_trait::async_trait]
pub trait UsageLedger: Send + Sync {
    async fn append(&self, record: &UsageRecord) -> InventoryResult<()>;
    async fn records(&self) -> InventoryResult<Vec<UsageRecord>>;
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UsageLedger for InMemoryLedger {
    async fn append(&self, record: &UsageRecord) -> InventoryResult<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn records(&self) -> InventoryResult<Vec<UsageRecord>> {
        Ok(self.records.lock().await.clone())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonlLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl UsageLedger for JsonlLedger {
    async fn append(&self, record: &UsageRecord) -> InventoryResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        info!(
            "ledger: recorded {} ({} items) to {}",
            record.id,
            record.items.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn records(&self) -> InventoryResult<Vec<UsageRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(InventoryError::Io(e)),
        };
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(InventoryError::from))
            .collect()
    }
}
