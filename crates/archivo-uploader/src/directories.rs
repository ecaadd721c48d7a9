//! Directory path materializer: find-or-create remote directories for the
//! folder segments of a dropped file, with a session cache keyed by
//! `(parent | root, lowercased segment)`.

use std::collections::HashMap;

use archivo_core::models::upload::directory_segments;
use archivo_core::{
    AssetBackend, BackendError, CreateDirectoryRequest, DirectoryId, ModuleId, RepositoryId,
    Scope,
};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct DirectoryMaterializer {
    repository: RepositoryId,
    module: Option<ModuleId>,
    start: Option<DirectoryId>,
    cache: HashMap<String, DirectoryId>,
}

impl DirectoryMaterializer {
    pub fn new(scope: &Scope) -> Self {
        Self {
            repository: scope.repository,
            module: scope.module,
            start: scope.directory,
            cache: HashMap::new(),
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn cache_key(parent: Option<DirectoryId>, segment: &str) -> String {
        match parent {
            Some(parent) => format!("{}/{}", parent, segment.to_lowercase()),
            None => format!("root/{}", segment.to_lowercase()),
        }
    }

    /// Resolve the folder part of `relative_path` to a directory id, creating
    /// missing directories along the way.
    ///
    /// Starts at the session's directory (or root). If a segment cannot be
    /// looked up or created, the deepest directory resolved so far is
    /// returned and the file lands there.
    pub async fn ensure_path(
        &mut self,
        backend: &dyn AssetBackend,
        relative_path: &str,
    ) -> Option<DirectoryId> {
        let mut parent = self.start;

        for segment in directory_segments(relative_path) {
            let key = Self::cache_key(parent, segment);
            if let Some(id) = self.cache.get(&key) {
                debug!(segment, id, "Directory cache hit");
                parent = Some(*id);
                continue;
            }

            match self.resolve_segment(backend, parent, segment).await {
                Ok(id) => {
                    self.cache.insert(key, id);
                    parent = Some(id);
                }
                Err(err) => {
                    warn!(
                        path = relative_path,
                        segment,
                        parent = ?parent,
                        error = %err,
                        "Could not materialize directory; uploading into the nearest resolved directory"
                    );
                    break;
                }
            }
        }

        parent
    }

    async fn resolve_segment(
        &self,
        backend: &dyn AssetBackend,
        parent: Option<DirectoryId>,
        segment: &str,
    ) -> Result<DirectoryId, BackendError> {
        let wanted = segment.to_lowercase();
        let existing = backend
            .list_directories(self.repository, self.module, parent)
            .await?;

        // Without a parent filter the backend lists every level, so root
        // lookups keep only top-level directories.
        if let Some(found) = existing
            .iter()
            .filter(|d| parent.is_some() || d.parent.is_none())
            .find(|d| d.name.to_lowercase() == wanted)
        {
            debug!(segment, id = found.id, "Found existing directory");
            return Ok(found.id);
        }

        let created = backend
            .create_directory(&CreateDirectoryRequest {
                name: segment.to_string(),
                repository: self.repository,
                module: self.module,
                parent,
            })
            .await?;
        debug!(segment, id = created.id, parent = ?parent, "Created directory");
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockBackend;

    fn scope() -> Scope {
        Scope::new(1, Some(2), None)
    }

    #[tokio::test]
    async fn creates_each_segment_once_and_caches() {
        let backend = MockBackend::new();
        let mut dirs = DirectoryMaterializer::new(&scope());

        let first = dirs
            .ensure_path(&backend, "Campaign/2025/file.mp4")
            .await
            .unwrap();
        let calls_after_first = backend.calls();
        assert_eq!(calls_after_first.create_directory, 2);
        assert_eq!(calls_after_first.list_directories, 2);

        let second = dirs
            .ensure_path(&backend, "Campaign/2025/other.mp4")
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(), calls_after_first);
        assert_eq!(dirs.cached(), 2);

        let created = backend.directories();
        let campaign = created.iter().find(|d| d.name == "Campaign").unwrap();
        let year = created.iter().find(|d| d.name == "2025").unwrap();
        assert_eq!(campaign.parent, None);
        assert_eq!(year.parent, Some(campaign.id));
        assert_eq!(first, year.id);
    }

    #[tokio::test]
    async fn reuses_existing_directory_case_insensitively() {
        let backend = MockBackend::new();
        let ads = backend.add_directory(1, Some(2), "ADS", None);
        let mut dirs = DirectoryMaterializer::new(&scope());

        let resolved = dirs.ensure_path(&backend, "ads/spot.mp4").await;

        assert_eq!(resolved, Some(ads));
        assert_eq!(backend.calls().create_directory, 0);
    }

    #[tokio::test]
    async fn root_lookup_ignores_nested_namesakes() {
        let backend = MockBackend::new();
        let parent = backend.add_directory(1, Some(2), "Other", None);
        backend.add_directory(1, Some(2), "Ads", Some(parent));
        let mut dirs = DirectoryMaterializer::new(&scope());

        let resolved = dirs.ensure_path(&backend, "Ads/spot.mp4").await.unwrap();

        assert_ne!(resolved, parent);
        assert_eq!(backend.calls().create_directory, 1);
    }

    #[tokio::test]
    async fn starts_from_session_directory() {
        let backend = MockBackend::new();
        let current = backend.add_directory(1, Some(2), "Current", None);
        let mut dirs = DirectoryMaterializer::new(&Scope::new(1, Some(2), Some(current)));

        assert_eq!(dirs.ensure_path(&backend, "spot.mp4").await, Some(current));
        assert_eq!(backend.calls().directory_calls(), 0);

        let nested = dirs.ensure_path(&backend, "Q1/spot.mp4").await.unwrap();
        let record = backend
            .directories()
            .into_iter()
            .find(|d| d.id == nested)
            .unwrap();
        assert_eq!(record.parent, Some(current));
    }

    #[tokio::test]
    async fn failure_falls_back_to_current_parent() {
        let backend = MockBackend::new();
        backend.fail_directories(true);
        let mut dirs = DirectoryMaterializer::new(&Scope::new(1, Some(2), Some(7)));

        let resolved = dirs.ensure_path(&backend, "Ads/Q1/spot.mp4").await;

        assert_eq!(resolved, Some(7));
        assert_eq!(dirs.cached(), 0);
        // Stops at the first failing segment.
        assert_eq!(backend.calls().list_directories, 1);
    }
}
