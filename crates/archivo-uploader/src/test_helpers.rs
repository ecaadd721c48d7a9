//! In-memory backend for exercising the upload engine without a server.
//!
//! State lives behind `Arc<Mutex<..>>` so a clone handed to the session and a
//! clone kept by the test observe the same calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use archivo_core::{
    AssetBackend, AssetRecord, BackendError, CreateDirectoryRequest, DirectoryId,
    DirectoryRecord, ModuleId, ModuleType, ProgressFn, RepositoryId, Scope, UploadRequest,
};
use async_trait::async_trait;

/// Number of calls made per endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub list_assets: usize,
    pub list_directories: usize,
    pub create_directory: usize,
    pub upload: usize,
}

impl MockCalls {
    pub fn directory_calls(&self) -> usize {
        self.list_directories + self.create_directory
    }
}

#[derive(Default)]
struct MockState {
    assets: Vec<(&'static str, Scope, AssetRecord)>,
    directories: Vec<(RepositoryId, Option<ModuleId>, DirectoryRecord)>,
    next_directory_id: DirectoryId,
    uploads: Vec<UploadRequest>,
    calls: MockCalls,
    events: Vec<String>,
    fail_asset_listing: bool,
    fail_directories: bool,
    upload_failures: HashMap<String, BackendError>,
    upload_delay: Option<Duration>,
}

#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_directory_id: 100,
                ..MockState::default()
            })),
        }
    }

    /// Register a server-side asset, stored the way the backend stores it:
    /// extension-stripped display name plus a file path.
    pub fn add_asset(&self, module_type: &ModuleType, scope: Scope, file_name: &str) {
        let record = AssetRecord {
            id: None,
            nombre_original: Some(archivo_core::strip_extension(file_name).to_string()),
            archivo_original: Some(format!("/media/originals/{}", file_name)),
        };
        self.state
            .lock()
            .unwrap()
            .assets
            .push((module_type.resource(), scope, record));
    }

    pub fn add_directory(
        &self,
        repository: RepositoryId,
        module: Option<ModuleId>,
        name: &str,
        parent: Option<DirectoryId>,
    ) -> DirectoryId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_directory_id;
        state.next_directory_id += 1;
        state.directories.push((
            repository,
            module,
            DirectoryRecord {
                id,
                name: name.to_string(),
                parent,
            },
        ));
        id
    }

    pub fn fail_asset_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_asset_listing = fail;
    }

    pub fn fail_directories(&self, fail: bool) {
        self.state.lock().unwrap().fail_directories = fail;
    }

    pub fn fail_upload(&self, file_name: &str, error: BackendError) {
        self.state
            .lock()
            .unwrap()
            .upload_failures
            .insert(file_name.to_string(), error);
    }

    /// Spread each upload over this duration (four progress steps).
    pub fn set_upload_delay(&self, delay: Duration) {
        self.state.lock().unwrap().upload_delay = Some(delay);
    }

    pub fn calls(&self) -> MockCalls {
        self.state.lock().unwrap().calls
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn directories(&self) -> Vec<DirectoryRecord> {
        self.state
            .lock()
            .unwrap()
            .directories
            .iter()
            .map(|(_, _, d)| d.clone())
            .collect()
    }

    /// `start:<name>` / `end:<name>` markers in call order.
    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }
}

#[async_trait]
impl AssetBackend for MockBackend {
    async fn list_assets(
        &self,
        module_type: &ModuleType,
        scope: &Scope,
    ) -> Result<Vec<AssetRecord>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_assets += 1;
        if state.fail_asset_listing {
            return Err(BackendError::Transport("connection refused".to_string()));
        }
        let resource = module_type.resource();
        Ok(state
            .assets
            .iter()
            .filter(|(r, s, _)| *r == resource && s == scope)
            .map(|(_, _, record)| record.clone())
            .collect())
    }

    async fn list_directories(
        &self,
        repository: RepositoryId,
        module: Option<ModuleId>,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<DirectoryRecord>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_directories += 1;
        if state.fail_directories {
            return Err(BackendError::status(500, None, Some("boom".to_string())));
        }
        // Like the real filter: no parent parameter means every level.
        Ok(state
            .directories
            .iter()
            .filter(|(r, m, d)| {
                *r == repository && *m == module && (parent.is_none() || d.parent == parent)
            })
            .map(|(_, _, d)| d.clone())
            .collect())
    }

    async fn create_directory(
        &self,
        request: &CreateDirectoryRequest,
    ) -> Result<DirectoryRecord, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_directory += 1;
        if state.fail_directories {
            return Err(BackendError::status(500, None, Some("boom".to_string())));
        }
        let id = state.next_directory_id;
        state.next_directory_id += 1;
        let record = DirectoryRecord {
            id,
            name: request.name.clone(),
            parent: request.parent,
        };
        state
            .directories
            .push((request.repository, request.module, record.clone()));
        Ok(record)
    }

    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressFn,
    ) -> Result<(), BackendError> {
        let name = request.file.name.clone();
        let (delay, failure) = {
            let mut state = self.state.lock().unwrap();
            state.calls.upload += 1;
            state.events.push(format!("start:{}", name));
            (state.upload_delay, state.upload_failures.get(&name).cloned())
        };

        let total = request.file.size.max(1);
        for step in 1..=4u64 {
            match delay {
                Some(delay) => tokio::time::sleep(delay / 4).await,
                None => tokio::task::yield_now().await,
            }
            progress(total * step / 4, total);
        }

        let mut state = self.state.lock().unwrap();
        state.events.push(format!("end:{}", name));
        if let Some(err) = failure {
            return Err(err);
        }
        state.uploads.push(request);
        Ok(())
    }
}
