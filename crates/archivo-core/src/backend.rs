//! The narrow request/response contract the upload engine needs from the API.
//!
//! The reqwest client implements this trait; tests use an in-memory backend.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::BackendError;
use crate::models::{
    AssetRecord, CreateDirectoryRequest, DirectoryId, DirectoryRecord, ModuleId, ModuleType,
    RepositoryId, Scope, SourceFile,
};
use crate::naming::strip_extension;

/// Byte-progress callback: `(bytes_sent, bytes_total)`.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Everything one multipart upload carries.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub module_type: ModuleType,
    pub repository: RepositoryId,
    pub module: Option<ModuleId>,
    pub directory: Option<DirectoryId>,
    pub file: SourceFile,
}

impl UploadRequest {
    /// `nombre_original`: the file name without its extension.
    pub fn original_name(&self) -> &str {
        strip_extension(&self.file.name)
    }

    /// Empty slate fields, filled in later through the edit flow.
    pub fn pizarra_placeholder() -> Value {
        json!({
            "producto": "",
            "cliente": "",
            "agencia": "",
            "version": "",
            "duracion": "",
            "formato": "",
            "fecha": ""
        })
    }

    pub fn metadata_placeholder() -> Value {
        json!({})
    }
}

#[async_trait]
pub trait AssetBackend: Send + Sync {
    /// `GET <resource>/?repositorio=&modulo=[&directorio=]`
    async fn list_assets(
        &self,
        module_type: &ModuleType,
        scope: &Scope,
    ) -> Result<Vec<AssetRecord>, BackendError>;

    /// `GET directorios/?repositorio=&modulo=[&parent=]`
    async fn list_directories(
        &self,
        repository: RepositoryId,
        module: Option<ModuleId>,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<DirectoryRecord>, BackendError>;

    /// `POST directorios/`
    async fn create_directory(
        &self,
        request: &CreateDirectoryRequest,
    ) -> Result<DirectoryRecord, BackendError>;

    /// `POST <resource>/` multipart. Dropping the returned future aborts the request.
    async fn upload(&self, request: UploadRequest, progress: ProgressFn)
        -> Result<(), BackendError>;
}
