use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::naming::DuplicateKey;

/// Handle to the raw bytes of a local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

/// A file plus the relative path it was found at (folder segments included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeEntry {
    pub file: SourceFile,
    pub relative_path: String,
}

impl IntakeEntry {
    /// Entry for a loose file: the relative path is the file name.
    pub fn loose(file: SourceFile) -> Self {
        let relative_path = file.name.clone();
        Self {
            file,
            relative_path,
        }
    }

    /// Folder segments of the relative path, without the trailing file name.
    pub fn directory_segments(&self) -> Vec<&str> {
        directory_segments(&self.relative_path)
    }

    pub fn has_directory(&self) -> bool {
        !self.directory_segments().is_empty()
    }
}

/// Split `a/b/file.ext` into `["a", "b"]`. Empty segments are skipped.
pub fn directory_segments(relative_path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = relative_path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    segments.pop();
    segments
}

/// Session-unique item id: `name-timestamp-random`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadItemId(String);

impl UploadItemId {
    pub fn generate(name: &str) -> Self {
        Self(format!(
            "{}-{}-{}",
            name,
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Error,
}

impl UploadStatus {
    /// pending -> uploading -> {completed | error}, nothing else.
    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Pending, UploadStatus::Uploading)
                | (UploadStatus::Uploading, UploadStatus::Completed)
                | (UploadStatus::Uploading, UploadStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed => "completed",
            UploadStatus::Error => "error",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-intended upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadItem {
    pub id: UploadItemId,
    pub file: SourceFile,
    pub name: String,
    pub size: u64,
    pub relative_path: String,
    pub status: UploadStatus,
    pub progress: u8,
    pub error: Option<String>,
}

impl UploadItem {
    pub fn from_entry(entry: IntakeEntry) -> Self {
        let name = entry.file.name.clone();
        Self {
            id: UploadItemId::generate(&name),
            size: entry.file.size,
            file: entry.file,
            name,
            relative_path: entry.relative_path,
            status: UploadStatus::Pending,
            progress: 0,
            error: None,
        }
    }

    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::from_name(&self.name)
    }

    pub fn directory_segments(&self) -> Vec<&str> {
        directory_segments(&self.relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/tmp").join(name),
            name: name.to_string(),
            size: 10,
        }
    }

    #[test]
    fn status_transitions_are_one_directional() {
        use UploadStatus::*;
        assert!(Pending.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Completed));
        assert!(Uploading.can_transition_to(Error));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Uploading.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Uploading));
        assert!(!Error.can_transition_to(Pending));
    }

    #[test]
    fn ids_differ_for_same_name() {
        let a = UploadItem::from_entry(IntakeEntry::loose(source("a.mp4")));
        let b = UploadItem::from_entry(IntakeEntry::loose(source("a.mp4")));
        assert_ne!(a.id, b.id);
        assert_eq!(a.duplicate_key(), b.duplicate_key());
        assert!(a.id.as_str().starts_with("a.mp4-"));
    }

    #[test]
    fn directory_segments_strip_file_name() {
        assert_eq!(directory_segments("Ads/Q1/spot1.mp4"), vec!["Ads", "Q1"]);
        assert!(directory_segments("spot1.mp4").is_empty());
        assert_eq!(directory_segments("/Ads//spot1.mp4"), vec!["Ads"]);

        let entry = IntakeEntry::loose(source("x.mov"));
        assert!(!entry.has_directory());
    }

    #[test]
    fn new_items_start_pending() {
        let item = UploadItem::from_entry(IntakeEntry {
            file: source("spot.mov"),
            relative_path: "Ads/spot.mov".to_string(),
        });
        assert_eq!(item.status, UploadStatus::Pending);
        assert_eq!(item.progress, 0);
        assert_eq!(item.size, 10);
        assert_eq!(item.directory_segments(), vec!["Ads"]);
    }
}
