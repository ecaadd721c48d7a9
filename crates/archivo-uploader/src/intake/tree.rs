use std::fmt;

use archivo_core::{IntakeEntry, SourceFile};
use async_stream::stream;
use async_trait::async_trait;
use futures::Stream;

use super::IntakeError;

/// One node of a dropped file tree.
pub enum TreeEntry {
    File(SourceFile),
    Directory(Box<dyn DirectoryHandle>),
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        match self {
            TreeEntry::File(file) => &file.name,
            TreeEntry::Directory(dir) => dir.name(),
        }
    }
}

impl fmt::Debug for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeEntry::File(file) => f.debug_tuple("File").field(&file.name).finish(),
            TreeEntry::Directory(dir) => f.debug_tuple("Directory").field(&dir.name()).finish(),
        }
    }
}

/// A directory that can be opened for reading.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn open(&self) -> Result<Box<dyn EntryReader>, IntakeError>;
}

/// Paginated directory listing. An empty batch means the listing is exhausted.
#[async_trait]
pub trait EntryReader: Send {
    async fn read_entries(&mut self) -> Result<Vec<TreeEntry>, IntakeError>;
}

/// Lazily walk a dropped entry depth-first, yielding every file with its path
/// relative to the drop (`Folder/Sub/file.ext`). Finite and not restartable.
pub fn enumerate(root: TreeEntry) -> impl Stream<Item = Result<IntakeEntry, IntakeError>> + Send {
    stream! {
        match root {
            TreeEntry::File(file) => {
                yield Ok(IntakeEntry::loose(file));
            }
            TreeEntry::Directory(dir) => {
                let mut stack: Vec<(String, Box<dyn DirectoryHandle>)> =
                    vec![(dir.name().to_string(), dir)];

                while let Some((prefix, dir)) = stack.pop() {
                    let mut reader = match dir.open().await {
                        Ok(reader) => reader,
                        Err(err) => {
                            yield Err(err);
                            continue;
                        }
                    };

                    let mut subdirs = Vec::new();
                    loop {
                        let batch = match reader.read_entries().await {
                            Ok(batch) => batch,
                            Err(err) => {
                                yield Err(err);
                                break;
                            }
                        };
                        if batch.is_empty() {
                            break;
                        }
                        for entry in batch {
                            match entry {
                                TreeEntry::File(file) => {
                                    let relative_path = format!("{}/{}", prefix, file.name);
                                    yield Ok(IntakeEntry { file, relative_path });
                                }
                                TreeEntry::Directory(child) => {
                                    let child_prefix = format!("{}/{}", prefix, child.name());
                                    subdirs.push((child_prefix, child));
                                }
                            }
                        }
                    }

                    // First-listed subdirectory is walked first.
                    stack.extend(subdirs.into_iter().rev());
                }
            }
        }
    }
}
