//! Domain models

pub mod asset;
pub mod directory;
pub mod module;
pub mod scope;
pub mod upload;

pub use asset::AssetRecord;
pub use directory::{CreateDirectoryRequest, DirectoryRecord};
pub use module::{ModuleDescriptor, ModuleType};
pub use scope::{DirectoryId, ModuleId, RepositoryId, Scope};
pub use upload::{IntakeEntry, SourceFile, UploadItem, UploadItemId, UploadStatus};
