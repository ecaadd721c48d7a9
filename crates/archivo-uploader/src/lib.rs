//! Archivo upload engine
//!
//! Turns dropped and picked files into upload items, screens them against
//! the module's formats and the files that already exist, recreates dropped
//! folder structure as remote directories, and uploads one file at a time
//! with per-file progress and whole-batch cancellation.

pub mod admission;
pub mod directories;
pub mod index;
pub mod intake;
pub mod queue;
pub mod scheduler;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use admission::{admit, AdmissionError, AdmissionOutcome};
pub use directories::DirectoryMaterializer;
pub use index::{ExistingAssetIndex, IndexError, IndexState, IndexTicket};
pub use intake::{collect, IntakeBatch, IntakeError, IntakeSource, PickedFile, TreeEntry};
pub use queue::{format_file_size, QueueError, QueueSummary, UploadQueue};
pub use scheduler::{
    run_batch, BatchControl, BatchOutcome, BatchReport, BatchState, BatchTarget, NoopObserver,
    SchedulerError, UploadObserver,
};
pub use session::{IntakeReport, UploadSession};
