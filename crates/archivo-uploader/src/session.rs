//! One upload session for a (repository, module, directory) scope.
//!
//! The session owns every piece of mutable state the engine needs: the
//! existing-asset index, the directory cache, the queue and the batch
//! control. Changing scope starts over with fresh state.

use std::sync::Arc;

use archivo_core::{
    aggregate_rejections, AssetBackend, FormatRejection, FormatValidator, IntakeEntry,
    ModuleDescriptor, ModuleType, Scope, SessionOptions, UploadItem, UploadItemId,
};
use tracing::info;

use crate::admission::{admit, skipped_message, AdmissionError};
use crate::directories::DirectoryMaterializer;
use crate::index::{ExistingAssetIndex, IndexError};
use crate::intake::{collect, IntakeError, IntakeSource};
use crate::queue::{QueueError, UploadQueue};
use crate::scheduler::{
    run_batch, BatchControl, BatchReport, BatchTarget, SchedulerError, UploadObserver,
};

/// What happened to one round of dropped or picked files.
#[derive(Debug, Default)]
pub struct IntakeReport {
    pub admitted: Vec<UploadItemId>,
    pub rejected: Vec<FormatRejection>,
    pub skipped: Vec<String>,
    pub intake_errors: Vec<IntakeError>,
    pub warning: Option<String>,
}

impl IntakeReport {
    /// User-facing messages, one per category that has something to say.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if let Some(warning) = &self.warning {
            messages.push(warning.clone());
        }
        if let Some(rejected) = aggregate_rejections(&self.rejected) {
            messages.push(rejected);
        }
        if let Some(skipped) = skipped_message(&self.skipped) {
            messages.push(skipped);
        }
        if !self.intake_errors.is_empty() {
            let lines = self
                .intake_errors
                .iter()
                .map(|e| format!("• {}", e))
                .collect::<Vec<_>>()
                .join("\n");
            messages.push(format!("Some dropped items could not be read:\n\n{}", lines));
        }
        messages
    }
}

pub struct UploadSession {
    backend: Arc<dyn AssetBackend>,
    scope: Scope,
    module: Option<ModuleDescriptor>,
    options: SessionOptions,
    index: ExistingAssetIndex,
    directories: DirectoryMaterializer,
    queue: UploadQueue,
    control: BatchControl,
}

impl UploadSession {
    /// The index starts unloaded; call `refresh_index` before admitting files.
    pub fn new(
        backend: Arc<dyn AssetBackend>,
        scope: Scope,
        module: Option<ModuleDescriptor>,
        options: SessionOptions,
    ) -> Self {
        Self {
            backend,
            directories: DirectoryMaterializer::new(&scope),
            scope,
            module,
            options,
            index: ExistingAssetIndex::new(),
            queue: UploadQueue::new(),
            control: BatchControl::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn module(&self) -> Option<&ModuleDescriptor> {
        self.module.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn index(&self) -> &ExistingAssetIndex {
        &self.index
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    /// Handle for cancelling the running batch from elsewhere.
    pub fn control(&self) -> BatchControl {
        self.control.clone()
    }

    pub fn module_type(&self) -> ModuleType {
        self.module
            .as_ref()
            .map(|m| m.module_type.clone())
            .unwrap_or_default()
    }

    pub fn validator(&self) -> FormatValidator {
        FormatValidator::new(self.module.as_ref())
    }

    pub async fn refresh_index(&mut self) -> Result<usize, IndexError> {
        let module_type = self.module_type();
        self.index
            .refresh(self.backend.as_ref(), &module_type, self.scope)
            .await
    }

    /// Switch to another scope: cancel any run, drop the directory cache and
    /// the queue, then reload the index.
    pub async fn change_scope(
        &mut self,
        scope: Scope,
        module: Option<ModuleDescriptor>,
    ) -> Result<usize, IndexError> {
        info!(from = %self.scope, to = %scope, "Changing upload scope");
        self.control.cancel();
        self.scope = scope;
        self.module = module;
        self.directories = DirectoryMaterializer::new(&scope);
        self.queue.clear();
        self.control = BatchControl::new();
        self.refresh_index().await
    }

    /// Normalize, validate and admit files from any intake source.
    pub async fn add(&mut self, sources: Vec<IntakeSource>) -> Result<IntakeReport, AdmissionError> {
        let batch = collect(sources).await;
        let mut report = self.add_entries(batch.entries)?;
        report.intake_errors = batch.errors;
        Ok(report)
    }

    pub fn add_entries(&mut self, entries: Vec<IntakeEntry>) -> Result<IntakeReport, AdmissionError> {
        let partition = self.validator().partition(entries);
        let outcome = admit(
            &mut self.queue,
            &self.index,
            partition.accepted,
            &self.options,
        )?;

        info!(
            admitted = outcome.admitted.len(),
            rejected = partition.rejected.len(),
            skipped = outcome.skipped.len(),
            "Files added to upload queue"
        );

        Ok(IntakeReport {
            admitted: outcome.admitted,
            rejected: partition.rejected,
            skipped: outcome.skipped,
            intake_errors: Vec::new(),
            warning: outcome.warning,
        })
    }

    pub fn remove(&mut self, id: &UploadItemId) -> Result<UploadItem, QueueError> {
        self.queue.remove(id)
    }

    /// Upload every pending item, one at a time.
    pub async fn start_batch(
        &mut self,
        observer: &dyn UploadObserver,
    ) -> Result<BatchReport, SchedulerError> {
        let target = BatchTarget {
            backend: self.backend.as_ref(),
            scope: self.scope,
            module_type: self.module_type(),
            preserve_folders: self.options.preserve_folders,
        };
        run_batch(
            &target,
            &mut self.queue,
            &mut self.index,
            &mut self.directories,
            &self.control,
            observer,
        )
        .await
    }
}
