//! Local filesystem implementation of the drop/pick sources.

use std::path::{Path, PathBuf};

use archivo_core::SourceFile;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tracing::{debug, warn};

use super::{enumerate, DirectoryHandle, EntryReader, IntakeError, PickedFile, TreeEntry};

/// Entries handed out per `read_entries` call.
const READ_BATCH: usize = 64;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    pub fn new(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self { path, name }
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<Box<dyn EntryReader>, IntakeError> {
        let entries = fs::read_dir(&self.path)
            .await
            .map_err(|e| IntakeError::io(&self.path, e))?;
        Ok(Box::new(LocalEntryReader {
            path: self.path.clone(),
            entries,
            done: false,
        }))
    }
}

pub struct LocalEntryReader {
    path: PathBuf,
    entries: fs::ReadDir,
    done: bool,
}

#[async_trait]
impl EntryReader for LocalEntryReader {
    async fn read_entries(&mut self) -> Result<Vec<TreeEntry>, IntakeError> {
        let mut batch = Vec::new();
        // Only return an empty batch once the directory is exhausted.
        while !self.done && batch.len() < READ_BATCH {
            let next = self
                .entries
                .next_entry()
                .await
                .map_err(|e| IntakeError::io(&self.path, e))?;
            let Some(entry) = next else {
                self.done = true;
                break;
            };
            match classify(entry.path()).await {
                Ok(Some(tree_entry)) => batch.push(tree_entry),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "Skipping unreadable entry"),
            }
        }
        Ok(batch)
    }
}

/// File or directory for `path` (symlinks followed); `None` for anything else.
async fn classify(path: PathBuf) -> Result<Option<TreeEntry>, IntakeError> {
    let metadata = fs::metadata(&path)
        .await
        .map_err(|e| IntakeError::io(&path, e))?;

    if metadata.is_dir() {
        Ok(Some(TreeEntry::Directory(Box::new(LocalDirectory::new(path)))))
    } else if metadata.is_file() {
        Ok(Some(TreeEntry::File(SourceFile {
            name: display_name(&path),
            size: metadata.len(),
            path,
        })))
    } else {
        debug!(path = %path.display(), "Skipping special file");
        Ok(None)
    }
}

/// Handle for a single local file.
pub async fn source_file(path: &Path) -> Result<SourceFile, IntakeError> {
    match classify(path.to_path_buf()).await? {
        Some(TreeEntry::File(file)) => Ok(file),
        _ => Err(IntakeError::Unsupported(path.to_path_buf())),
    }
}

/// Treat a path as a drag-and-drop item: a loose file or a whole folder.
pub async fn dropped_entry(path: &Path) -> Result<TreeEntry, IntakeError> {
    let path = fs::canonicalize(path)
        .await
        .map_err(|e| IntakeError::io(path, e))?;
    classify(path.clone())
        .await?
        .ok_or(IntakeError::Unsupported(path))
}

/// Multi-select picker: plain files, no folder semantics.
pub async fn pick_files(paths: &[PathBuf]) -> Result<Vec<PickedFile>, IntakeError> {
    let mut picked = Vec::with_capacity(paths.len());
    for path in paths {
        picked.push(PickedFile {
            file: source_file(path).await?,
            relative_path: None,
        });
    }
    Ok(picked)
}

/// Folder picker: every file below `path`, with a relative path that starts
/// at the picked folder's name.
pub async fn pick_folder(path: &Path) -> Result<Vec<PickedFile>, IntakeError> {
    let root = match dropped_entry(path).await? {
        dir @ TreeEntry::Directory(_) => dir,
        TreeEntry::File(_) => return Err(IntakeError::Unsupported(path.to_path_buf())),
    };

    let mut picked = Vec::new();
    let mut walk = Box::pin(enumerate(root));
    while let Some(result) = walk.next().await {
        match result {
            Ok(entry) => picked.push(PickedFile {
                file: entry.file,
                relative_path: Some(entry.relative_path),
            }),
            Err(err) => warn!(error = %err, "Skipping unreadable folder entry"),
        }
    }
    Ok(picked)
}
