//! Durable file spool for outgoing mail.
//!
//! [`FileSpoolBackend`] writes each message as a JSON file into a spool
//! directory; the write is atomic (temp file + rename), so a message is
//! either fully queued or not at all. [`flush_spool`] is the delivery side:
//! it drains the directory through another backend, removing each file only
//! after a successful hand-off. A file that fails delivery stays in place
//! for the next flush.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use anvil_forms_core::{FormsError, FormsResult};

use crate::backend::MailBackend;
use crate::message::EmailMessage;

/// File extension of queued spool entries.
const SPOOL_EXTENSION: &str = "json";

/// A [`MailBackend`] that queues messages on disk.
#[derive(Debug, Clone)]
pub struct FileSpoolBackend {
    spool_dir: PathBuf,
}

impl FileSpoolBackend {
    /// Creates a spool backend over the given directory, creating the
    /// directory if needed.
    pub fn new(spool_dir: impl Into<PathBuf>) -> FormsResult<Self> {
        let spool_dir = spool_dir.into();
        std::fs::create_dir_all(&spool_dir)?;
        Ok(Self { spool_dir })
    }

    /// Returns the spool directory.
    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }

    /// Returns the queued messages currently on the spool, oldest first by
    /// file name.
    pub fn queued(&self) -> FormsResult<Vec<EmailMessage>> {
        let mut messages = Vec::new();
        for path in spool_files(&self.spool_dir)? {
            let content = std::fs::read_to_string(&path)?;
            let message = serde_json::from_str(&content).map_err(|e| {
                FormsError::Serialization(format!(
                    "Corrupt spool file '{}': {e}",
                    path.display()
                ))
            })?;
            messages.push(message);
        }
        Ok(messages)
    }

    /// Returns the number of messages waiting on the spool.
    pub fn queued_count(&self) -> FormsResult<usize> {
        Ok(spool_files(&self.spool_dir)?.len())
    }
}

#[async_trait]
impl MailBackend for FileSpoolBackend {
    async fn send_message(&self, message: &EmailMessage) -> FormsResult<String> {
        let id = Uuid::new_v4().to_string();
        let final_path = self.spool_dir.join(format!("{id}.{SPOOL_EXTENSION}"));
        let tmp_path = self.spool_dir.join(format!("{id}.tmp"));

        let payload = serde_json::to_vec_pretty(message)
            .map_err(|e| FormsError::Serialization(format!("Failed to encode message: {e}")))?;

        tokio::fs::write(&tmp_path, payload).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;

        debug!(id = %id, to = ?message.to, "queued message on mail spool");
        Ok(id)
    }
}

/// Drains the spool directory through a delivery backend.
///
/// Each queued file is deserialized and handed to `delivery`; the file is
/// removed only after the backend accepts the message. Failed or corrupt
/// entries are logged and left in place. Returns the number of messages
/// delivered.
pub async fn flush_spool(
    spool_dir: impl AsRef<Path>,
    delivery: &dyn MailBackend,
) -> FormsResult<usize> {
    let mut delivered = 0;

    for path in spool_files(spool_dir.as_ref())? {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read spool file");
                continue;
            }
        };

        let message: EmailMessage = match serde_json::from_str(&content) {
            Ok(message) => message,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt spool file, skipping");
                continue;
            }
        };

        match delivery.send_message(&message).await {
            Ok(_) => {
                tokio::fs::remove_file(&path).await?;
                delivered += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "delivery failed, keeping spool file");
            }
        }
    }

    Ok(delivered)
}

/// Lists queued spool files, sorted by file name.
fn spool_files(spool_dir: &Path) -> FormsResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(spool_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(SPOOL_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
