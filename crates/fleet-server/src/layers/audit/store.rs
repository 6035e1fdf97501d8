use super::records::{AuditRecord, StateRecord};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub(crate) const AUDIT_TABLE: &str = "command_log.jsonl";
pub(crate) const STATE_TABLE: &str = "cluster_state.jsonl";

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("record store is closed")]
    Closed,
    #[error("record store write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub(crate) trait RecordStore: Send + Sync {
    async fn insert_audit(&self, record: &AuditRecord) -> Result<(), StoreError>;

    async fn insert_state(&self, record: &StateRecord) -> Result<(), StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

struct Tables {
    audit: File,
    state: File,
}

pub(crate) struct JsonlStore {
    dir: PathBuf,
    tables: Mutex<Option<Tables>>,
}

impl JsonlStore {
    pub(crate) async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        let tables = Tables {
            audit: open_table(&dir.join(AUDIT_TABLE)).await?,
            state: open_table(&dir.join(STATE_TABLE)).await?,
        };
        Ok(Self {
            dir,
            tables: Mutex::new(Some(tables)),
        })
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn open_table(path: &Path) -> Result<File, StoreError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(file)
}

async fn append_row<T: Serialize>(file: &mut File, row: &T) -> Result<(), StoreError> {
    let mut line = serde_json::to_vec(row)?;
    line.push(b'\n');
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl RecordStore for JsonlStore {
    async fn insert_audit(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let tables = tables.as_mut().ok_or(StoreError::Closed)?;
        append_row(&mut tables.audit, record).await
    }

    async fn insert_state(&self, record: &StateRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let tables = tables.as_mut().ok_or(StoreError::Closed)?;
        append_row(&mut tables.state, record).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        let Some(tables) = self.tables.lock().await.take() else {
            return Err(StoreError::Closed);
        };
        tables.audit.sync_all().await?;
        tables.state.sync_all().await?;
        tracing::info!(event = "store.closed", dir = %self.dir.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct NullStore {
    closed: AtomicBool,
}

impl NullStore {
    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for NullStore {
    async fn insert_audit(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.check_open()?;
        tracing::debug!(event = "store.null.audit", record = ?record);
        Ok(())
    }

    async fn insert_state(&self, record: &StateRecord) -> Result<(), StoreError> {
        self.check_open()?;
        tracing::debug!(event = "store.null.state", record = ?record);
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}
