//! Archivo Core Library
//!
//! Domain models, naming rules, format validation, error types and configuration
//! shared by the API client, the upload engine and the CLI.

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod validation;

// Re-export commonly used types
pub use backend::{AssetBackend, ProgressFn, UploadRequest};
pub use config::{ClientConfig, SessionOptions};
pub use error::{BackendError, UploadFailure, CANCELLED_MESSAGE, GENERIC_UPLOAD_ERROR};
pub use models::{
    AssetRecord, CreateDirectoryRequest, DirectoryId, DirectoryRecord, IntakeEntry,
    ModuleDescriptor, ModuleId, ModuleType, RepositoryId, Scope, SourceFile, UploadItem,
    UploadItemId, UploadStatus,
};
pub use naming::{build_key, strip_extension, DuplicateKey};
pub use validation::{
    aggregate_rejections, FormatCheck, FormatPartition, FormatRejection, FormatValidator,
};
