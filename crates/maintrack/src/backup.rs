//! Backup documents.
//!
//! A backup is one JSON object with an optional field per collection:
//! `equipos`, `tareas`, `ots` and `checklist`. The same shape is written by
//! export and read by restore, and it is compatible with files downloaded
//! from the maintenance web page.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::records::{Checklists, Equipment, Task, WorkOrder};

/// Key reported in `Error::CorruptRecord` when an imported document fails to parse.
pub const BACKUP_RECORD_KEY: &str = "backup";

/// Every collection, each optional.
///
/// On restore an absent (or `null`) field clears its collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    /// Equipment list.
    #[serde(rename = "equipos", default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<Equipment>>,
    /// Task list.
    #[serde(rename = "tareas", default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    /// Work order list.
    #[serde(rename = "ots", default, skip_serializing_if = "Option::is_none")]
    pub work_orders: Option<Vec<WorkOrder>>,
    /// Checklist mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Checklists>,
}

impl BackupDocument {
    /// Parse a backup document.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptRecord` if `text` is not a valid backup.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| Error::corrupt_record(BACKUP_RECORD_KEY, source))
    }

    /// Render the document as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}

/// Read and parse a backup file.
///
/// The document is only available once the returned future resolves.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or
/// `Error::CorruptRecord` if its contents are not a valid backup.
pub async fn read_backup(path: impl AsRef<Path>) -> Result<BackupDocument> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await?;
    debug!(path = %path.display(), bytes = text.len(), "Read backup file");
    BackupDocument::from_json(&text)
}

/// Write `document` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn write_backup(
    path: impl AsRef<Path>,
    document: &BackupDocument,
    pretty: bool,
) -> Result<()> {
    let path = path.as_ref();
    let text = document.to_json(pretty)?;
    tokio::fs::write(path, text.as_bytes()).await?;
    debug!(path = %path.display(), bytes = text.len(), "Wrote backup file");
    Ok(())
}
