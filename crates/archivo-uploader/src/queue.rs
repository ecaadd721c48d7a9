//! Upload queue: ordered session records, append-only except for removal of
//! pending items by the user and status/progress updates by the scheduler.

use std::fmt;

use archivo_core::{DuplicateKey, UploadItem, UploadItemId, UploadStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("No upload with id {0}")]
    NotFound(UploadItemId),

    #[error("Upload {id} is {status}; only pending uploads can be removed")]
    NotPending {
        id: UploadItemId,
        status: UploadStatus,
    },
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    items: Vec<UploadItem>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn get(&self, id: &UploadItemId) -> Option<&UploadItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of every pending item, in queue order.
    pub fn pending_ids(&self) -> Vec<UploadItemId> {
        self.items
            .iter()
            .filter(|item| item.status == UploadStatus::Pending)
            .map(|item| item.id.clone())
            .collect()
    }

    /// Whether a pending, uploading or completed item has this key. Failed
    /// items don't count, so a file can be dropped again after an error.
    pub fn contains_key(&self, key: &DuplicateKey) -> bool {
        self.items
            .iter()
            .any(|item| item.status != UploadStatus::Error && &item.duplicate_key() == key)
    }

    pub(crate) fn push(&mut self, item: UploadItem) {
        self.items.push(item);
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove an item the user no longer wants. Only pending items qualify.
    pub fn remove(&mut self, id: &UploadItemId) -> Result<UploadItem, QueueError> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;

        let status = self.items[index].status;
        if status != UploadStatus::Pending {
            return Err(QueueError::NotPending {
                id: id.clone(),
                status,
            });
        }
        Ok(self.items.remove(index))
    }

    fn transition(&mut self, id: &UploadItemId, next: UploadStatus) -> Option<&mut UploadItem> {
        let item = self.items.iter_mut().find(|item| &item.id == id)?;
        if !item.status.can_transition_to(next) {
            tracing::warn!(
                id = %item.id,
                from = %item.status,
                to = %next,
                "Ignoring invalid upload status transition"
            );
            return None;
        }
        item.status = next;
        Some(item)
    }

    pub(crate) fn mark_uploading(&mut self, id: &UploadItemId) -> bool {
        match self.transition(id, UploadStatus::Uploading) {
            Some(item) => {
                item.progress = 0;
                item.error = None;
                true
            }
            None => false,
        }
    }

    /// Raise the progress of an uploading item. Never lowers it.
    pub(crate) fn update_progress(&mut self, id: &UploadItemId, percent: u8) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| &item.id == id) else {
            return false;
        };
        let percent = percent.min(100);
        if item.status != UploadStatus::Uploading || percent <= item.progress {
            return false;
        }
        item.progress = percent;
        true
    }

    pub(crate) fn mark_completed(&mut self, id: &UploadItemId) -> bool {
        match self.transition(id, UploadStatus::Completed) {
            Some(item) => {
                item.progress = 100;
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_failed(&mut self, id: &UploadItemId, message: impl Into<String>) -> bool {
        match self.transition(id, UploadStatus::Error) {
            Some(item) => {
                item.error = Some(message.into());
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> QueueSummary {
        let mut summary = QueueSummary {
            total: self.items.len(),
            ..QueueSummary::default()
        };
        for item in &self.items {
            summary.total_bytes += item.size;
            match item.status {
                UploadStatus::Pending => summary.pending += 1,
                UploadStatus::Uploading => summary.uploading += 1,
                UploadStatus::Completed => summary.completed += 1,
                UploadStatus::Error => summary.errors += 1,
            }
        }
        summary
    }
}

/// Footer totals for the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub total: usize,
    pub pending: usize,
    pub uploading: usize,
    pub completed: usize,
    pub errors: usize,
    pub total_bytes: u64,
}

impl fmt::Display for QueueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) • {} completed • {} error(s)",
            self.total, self.completed, self.errors
        )
    }
}

/// Human-readable size, base 1024, at most two decimals: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;

    // Trim trailing zeros the way a JS number prints.
    let mut text = format!("{:.2}", rounded);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{} {}", text, UNITS[exponent])
}
