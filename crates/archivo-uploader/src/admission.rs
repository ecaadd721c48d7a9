//! Admission gate: duplicate-key checks against the server index and the
//! session queue before anything is enqueued.

use archivo_core::{DuplicateKey, IntakeEntry, SessionOptions, UploadItem, UploadItemId};
use tracing::{debug, warn};

use crate::index::{ExistingAssetIndex, IndexState};
use crate::queue::UploadQueue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Existing files could not be checked ({0}); refusing to queue uploads")]
    IndexUnavailable(IndexState),
}

#[derive(Debug, Default)]
pub struct AdmissionOutcome {
    pub admitted: Vec<UploadItemId>,
    /// Names skipped because the key already exists on the server or in the queue.
    pub skipped: Vec<String>,
    pub warning: Option<String>,
}

impl AdmissionOutcome {
    pub fn skipped_message(&self) -> Option<String> {
        skipped_message(&self.skipped)
    }
}

/// `The following files already exist and were skipped:` plus one bullet per name.
pub fn skipped_message(skipped: &[String]) -> Option<String> {
    if skipped.is_empty() {
        return None;
    }
    let lines = skipped
        .iter()
        .map(|name| format!("• {}", name))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!(
        "The following files already exist and were skipped:\n\n{}",
        lines
    ))
}

/// Enqueue every candidate whose duplicate key is neither known to the server
/// nor already queued. Candidates are checked in order, so the second of two
/// same-named files in one batch is skipped.
pub fn admit(
    queue: &mut UploadQueue,
    index: &ExistingAssetIndex,
    candidates: Vec<IntakeEntry>,
    options: &SessionOptions,
) -> Result<AdmissionOutcome, AdmissionError> {
    let mut outcome = AdmissionOutcome::default();

    if !index.is_fresh() {
        if options.block_on_stale_index {
            return Err(AdmissionError::IndexUnavailable(index.state().clone()));
        }
        warn!(
            index = %index.state(),
            "Admitting files without a fresh existing-asset index"
        );
        outcome.warning = Some(format!(
            "Existing files could not be checked ({}); duplicates already on the server may not be detected",
            index.state()
        ));
    }

    for entry in candidates {
        let key = DuplicateKey::from_name(&entry.file.name);
        if index.contains(&key) || queue.contains_key(&key) {
            debug!(file = %entry.file.name, key = %key, "Skipping duplicate");
            outcome.skipped.push(entry.file.name);
            continue;
        }

        let item = UploadItem::from_entry(entry);
        outcome.admitted.push(item.id.clone());
        queue.push(item);
    }

    Ok(outcome)
}
