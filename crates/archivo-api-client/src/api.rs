//! Domain methods for the Archivo API client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use archivo_core::{
    AssetBackend, AssetRecord, BackendError, CreateDirectoryRequest, DirectoryId,
    DirectoryRecord, ModuleDescriptor, ModuleId, ModuleType, ProgressFn, RepositoryId, Scope,
    UploadRequest,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;

use crate::ApiClient;

const DIRECTORIES_PATH: &str = "directorios/";

impl ApiClient {
    /// List assets of one resource family scoped to a repository/module/directory.
    pub async fn list_assets(
        &self,
        module_type: &ModuleType,
        scope: &Scope,
    ) -> Result<Vec<AssetRecord>, BackendError> {
        self.get(module_type.resource(), &scope.query()).await
    }

    /// List directories under `parent` (root when `None`).
    pub async fn list_directories(
        &self,
        repository: RepositoryId,
        module: Option<ModuleId>,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<DirectoryRecord>, BackendError> {
        let mut query = vec![("repositorio", repository.to_string())];
        if let Some(module) = module {
            query.push(("modulo", module.to_string()));
        }
        if let Some(parent) = parent {
            query.push(("parent", parent.to_string()));
        }
        self.get(DIRECTORIES_PATH, &query).await
    }

    pub async fn create_directory(
        &self,
        request: &CreateDirectoryRequest,
    ) -> Result<DirectoryRecord, BackendError> {
        self.post_json(DIRECTORIES_PATH, request).await
    }

    /// Fetch a module descriptor (type and allowed formats).
    pub async fn get_module(&self, module_id: ModuleId) -> Result<ModuleDescriptor, BackendError> {
        self.get(&format!("modulos/{}/", module_id), &[]).await
    }

    /// Upload one file as multipart, streaming it from disk and reporting bytes read.
    pub async fn upload_asset(
        &self,
        request: UploadRequest,
        progress: ProgressFn,
    ) -> Result<(), BackendError> {
        let file = tokio::fs::File::open(&request.file.path)
            .await
            .map_err(|e| {
                BackendError::LocalFile(format!("{}: {}", request.file.path.display(), e))
            })?;

        let total = request.file.size;
        let sent = Arc::new(AtomicU64::new(0));
        let body = ReaderStream::new(file).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                let now = sent.fetch_add(bytes.len() as u64, Ordering::Relaxed) + bytes.len() as u64;
                progress(now, total);
            }
            chunk
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
            .file_name(request.file.name.clone());

        let mut form = Form::new()
            .text("repositorio", request.repository.to_string())
            .part("archivo_original", part)
            .text("nombre_original", request.original_name().to_string());

        if let Some(directory) = request.directory {
            form = form.text("directorio", directory.to_string());
        }
        if let Some(module) = request.module {
            form = form.text("modulo", module.to_string());
        }

        form = form
            .text("pizarra", UploadRequest::pizarra_placeholder().to_string())
            .text("metadata", UploadRequest::metadata_placeholder().to_string());

        tracing::debug!(
            file = %request.file.name,
            resource = request.module_type.resource(),
            directory = ?request.directory,
            "Sending upload"
        );

        self.post_multipart(request.module_type.resource(), form)
            .await
    }
}

#[async_trait]
impl AssetBackend for ApiClient {
    async fn list_assets(
        &self,
        module_type: &ModuleType,
        scope: &Scope,
    ) -> Result<Vec<AssetRecord>, BackendError> {
        ApiClient::list_assets(self, module_type, scope).await
    }

    async fn list_directories(
        &self,
        repository: RepositoryId,
        module: Option<ModuleId>,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<DirectoryRecord>, BackendError> {
        ApiClient::list_directories(self, repository, module, parent).await
    }

    async fn create_directory(
        &self,
        request: &CreateDirectoryRequest,
    ) -> Result<DirectoryRecord, BackendError> {
        ApiClient::create_directory(self, request).await
    }

    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressFn,
    ) -> Result<(), BackendError> {
        self.upload_asset(request, progress).await
    }
}
