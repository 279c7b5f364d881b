//! Append-only JSON Lines storage for annotations

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::overlay::OverrideRecord;

/// Shared overlay log handle
pub type OverlayRef = Arc<dyn OverlayLog>;

/// Durable log of annotation records
#[async_trait]
pub trait OverlayLog: Send + Sync {
    /// Every record, oldest first
    async fn read_overrides(&self) -> CoreResult<Vec<OverrideRecord>>;

    /// Append one record; visible to readers once this returns
    async fn append_override(&self, record: &OverrideRecord) -> CoreResult<()>;
}

/// One JSON object per line
#[derive(Debug)]
pub struct JsonlOverlayLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlOverlayLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, error: std::io::Error) -> CoreError {
        CoreError::Io {
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl OverlayLog for JsonlOverlayLog {
    async fn read_overrides(&self) -> CoreResult<Vec<OverrideRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<OverrideRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!(
                    "Skipping unreadable record at {}:{}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ),
            }
        }
        Ok(records)
    }

    async fn append_override(&self, record: &OverrideRecord) -> CoreResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes()).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        file.sync_data().await.map_err(|e| self.io_error(e))?;

        log::debug!("Appended annotation for {} {}", record.date, record.account);
        Ok(())
    }
}
