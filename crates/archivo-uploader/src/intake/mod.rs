//! Intake pipeline: normalize dropped entries and picker selections into
//! `IntakeEntry { file, relative_path }` values.

pub mod local;
mod tree;

pub use tree::{enumerate, DirectoryHandle, EntryReader, TreeEntry};

use std::path::PathBuf;

use archivo_core::{IntakeEntry, SourceFile};
use futures::future::join_all;
use futures::StreamExt;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a regular file or directory: {}", .0.display())]
    Unsupported(PathBuf),
}

impl IntakeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IntakeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A file chosen through a picker. Folder pickers supply the relative path.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub file: SourceFile,
    pub relative_path: Option<String>,
}

impl PickedFile {
    pub fn into_entry(self) -> IntakeEntry {
        match self.relative_path.filter(|p| !p.trim().is_empty()) {
            Some(relative_path) => IntakeEntry {
                file: self.file,
                relative_path,
            },
            None => IntakeEntry::loose(self.file),
        }
    }
}

/// The three ways files reach the uploader.
pub enum IntakeSource {
    /// Drag-and-drop: loose files and whole folders.
    Dropped(Vec<TreeEntry>),
    /// Multi-select file picker.
    FilePicker(Vec<PickedFile>),
    /// Folder picker; every file carries its path below the picked folder.
    FolderPicker(Vec<PickedFile>),
}

#[derive(Debug, Default)]
pub struct IntakeBatch {
    pub entries: Vec<IntakeEntry>,
    pub errors: Vec<IntakeError>,
}

/// Normalize every source into one list of entries.
///
/// Dropped folders are walked concurrently, one stream per top-level entry.
/// Unreadable directories are logged, reported in `errors`, and skipped.
pub async fn collect(sources: Vec<IntakeSource>) -> IntakeBatch {
    let mut batch = IntakeBatch::default();

    for source in sources {
        match source {
            IntakeSource::Dropped(entries) => {
                let walks = entries
                    .into_iter()
                    .map(|entry| enumerate(entry).collect::<Vec<_>>());
                for result in join_all(walks).await.into_iter().flatten() {
                    match result {
                        Ok(entry) => batch.entries.push(entry),
                        Err(err) => {
                            warn!(error = %err, "Skipping unreadable dropped entry");
                            batch.errors.push(err);
                        }
                    }
                }
            }
            IntakeSource::FilePicker(files) | IntakeSource::FolderPicker(files) => {
                batch
                    .entries
                    .extend(files.into_iter().map(PickedFile::into_entry));
            }
        }
    }

    batch
}
