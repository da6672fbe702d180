//! Hand-off of a finished capture to whatever consumes it next
//!
//! Crossing a context boundary the composite travels as a
//! `{ imageUri, timestampMillis }` record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::{Composite, OutputError};

use super::to_data_uri;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    /// `data:image/png;base64,...`
    pub image_uri: String,
    pub timestamp_millis: i64,
}

impl CaptureRecord {
    pub fn from_composite(composite: &Composite) -> Result<Self, OutputError> {
        Ok(Self {
            image_uri: to_data_uri(&composite.image)?,
            timestamp_millis: chrono::Utc::now().timestamp_millis(),
        })
    }
}

/// Downstream consumer of finished captures
pub trait ResultSink {
    fn store_capture(&mut self, composite: &Composite) -> Result<()>;

    /// Tell the consumer a stored capture is ready to be picked up
    fn announce_result_ready(&mut self);
}

/// Stores the latest capture record as JSON on disk
#[derive(Debug, Clone)]
pub struct FileResultSink {
    path: PathBuf,
}

impl FileResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/pagestitch/current_capture.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(Config::ID).join("current_capture.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record, if any
    pub fn load(&self) -> Result<Option<CaptureRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read capture record: {}", self.path.display()))?;
        let record = serde_json::from_str(&json)
            .with_context(|| format!("Invalid capture record: {}", self.path.display()))?;
        Ok(Some(record))
    }
}

impl ResultSink for FileResultSink {
    fn store_capture(&mut self, composite: &Composite) -> Result<()> {
        let record = CaptureRecord::from_composite(composite)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string(&record)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write capture record: {}", self.path.display()))?;
        Ok(())
    }

    fn announce_result_ready(&mut self) {
        log::info!("Capture ready at {}", self.path.display());
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryResultSink {
    pub records: Vec<CaptureRecord>,
    pub announcements: usize,
}

impl ResultSink for MemoryResultSink {
    fn store_capture(&mut self, composite: &Composite) -> Result<()> {
        self.records.push(CaptureRecord::from_composite(composite)?);
        Ok(())
    }

    fn announce_result_ready(&mut self) {
        self.announcements += 1;
    }
}
