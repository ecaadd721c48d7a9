//! Sequential upload scheduler.
//!
//! One batch run uploads every pending item in queue order, one request at a
//! time. A single cancellation token per run aborts the in-flight request and
//! keeps the remaining items pending.

use std::sync::{Arc, Mutex};

use archivo_core::{
    AssetBackend, ModuleType, Scope, UploadFailure, UploadItem, UploadRequest, CANCELLED_MESSAGE,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::directories::DirectoryMaterializer;
use crate::index::ExistingAssetIndex;
use crate::queue::UploadQueue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    Completed,
    Cancelled,
}

impl From<BatchOutcome> for BatchState {
    fn from(outcome: BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Completed => BatchState::Completed,
            BatchOutcome::Cancelled => BatchState::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("No pending files")]
    NothingPending,

    #[error("A batch is already running")]
    AlreadyRunning,
}

#[derive(Debug, Default)]
struct ControlState {
    state: BatchState,
    token: Option<CancellationToken>,
}

/// Shared handle on the current batch run. Clones observe the same run, so
/// a UI (or signal handler) can cancel while the scheduler awaits.
#[derive(Debug, Clone, Default)]
pub struct BatchControl {
    inner: Arc<Mutex<ControlState>>,
}

impl BatchControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControlState> {
        // State is plain data; a poisoned lock still holds a usable value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> BatchState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == BatchState::Running
    }

    /// Trigger the current run's token. Returns `false` when nothing is running.
    pub fn cancel(&self) -> bool {
        let state = self.lock();
        match (&state.state, &state.token) {
            (BatchState::Running, Some(token)) => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Start a run with a fresh token.
    pub(crate) fn arm(&self) -> Result<CancellationToken, SchedulerError> {
        let mut state = self.lock();
        if state.state == BatchState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }
        let token = CancellationToken::new();
        state.state = BatchState::Running;
        state.token = Some(token.clone());
        Ok(token)
    }

    /// End the run and discard its token.
    pub(crate) fn finish(&self, outcome: BatchOutcome) {
        let mut state = self.lock();
        state.state = outcome.into();
        state.token = None;
    }
}

/// Disarms the control if a run is dropped before it finishes.
struct RunGuard<'a> {
    control: &'a BatchControl,
    token: CancellationToken,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.token.cancel();
            self.control.finish(BatchOutcome::Cancelled);
        }
    }
}

/// Callbacks for per-item and per-batch events. All methods default to no-ops.
pub trait UploadObserver {
    fn item_started(&self, _item: &UploadItem) {}

    fn item_progress(&self, _item: &UploadItem) {}

    fn item_finished(&self, _item: &UploadItem) {}

    /// Fired once per run, after the last item reaches a terminal state or
    /// cancellation stops the loop.
    fn batch_finished(&self, _report: &BatchReport) {}
}

pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub completed: usize,
    pub failed: usize,
    /// 1 when the in-flight item was aborted, else 0.
    pub cancelled: usize,
    /// Items selected for the run that were never started.
    pub not_started: usize,
}

/// Where the batch uploads to.
pub struct BatchTarget<'a> {
    pub backend: &'a dyn AssetBackend,
    pub scope: Scope,
    pub module_type: ModuleType,
    pub preserve_folders: bool,
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((sent.min(total) as f64 / total as f64) * 100.0).round() as u8
}

/// Run one batch over every currently pending item.
pub async fn run_batch(
    target: &BatchTarget<'_>,
    queue: &mut UploadQueue,
    index: &mut ExistingAssetIndex,
    directories: &mut DirectoryMaterializer,
    control: &BatchControl,
    observer: &dyn UploadObserver,
) -> Result<BatchReport, SchedulerError> {
    let selected = queue.pending_ids();
    if selected.is_empty() {
        return Err(SchedulerError::NothingPending);
    }

    let token = control.arm()?;
    let mut guard = RunGuard {
        control,
        token: token.clone(),
        finished: false,
    };

    info!(scope = %target.scope, items = selected.len(), "Starting upload batch");

    let mut report = BatchReport {
        outcome: BatchOutcome::Completed,
        completed: 0,
        failed: 0,
        cancelled: 0,
        not_started: 0,
    };

    for (position, id) in selected.iter().enumerate() {
        if token.is_cancelled() {
            report.not_started = selected.len() - position;
            break;
        }

        if !queue.mark_uploading(id) {
            continue;
        }
        let Some(item) = queue.get(id).cloned() else {
            continue;
        };
        observer.item_started(&item);

        match upload_item(target, queue, directories, &item, &token, observer).await {
            Ok(()) => {
                queue.mark_completed(id);
                index.record_uploaded(item.duplicate_key());
                report.completed += 1;
            }
            Err(UploadFailure::Cancelled) => {
                info!(file = %item.name, "Upload cancelled");
                queue.mark_failed(id, CANCELLED_MESSAGE);
                report.cancelled = 1;
                report.not_started = selected.len() - position - 1;
            }
            Err(failure) => {
                warn!(file = %item.name, error = %failure, "Upload failed");
                queue.mark_failed(id, failure.message());
                report.failed += 1;
            }
        }

        if let Some(finished) = queue.get(id) {
            observer.item_finished(finished);
        }
        if report.cancelled > 0 {
            break;
        }
    }

    if report.cancelled > 0 || report.not_started > 0 {
        report.outcome = BatchOutcome::Cancelled;
    }
    control.finish(report.outcome);
    guard.finished = true;

    info!(
        outcome = ?report.outcome,
        completed = report.completed,
        failed = report.failed,
        not_started = report.not_started,
        "Upload batch finished"
    );
    observer.batch_finished(&report);
    Ok(report)
}

/// Resolve the item's directory and upload it, racing both against the token.
/// Byte progress is forwarded into the queue while the request runs.
async fn upload_item(
    target: &BatchTarget<'_>,
    queue: &mut UploadQueue,
    directories: &mut DirectoryMaterializer,
    item: &UploadItem,
    token: &CancellationToken,
    observer: &dyn UploadObserver,
) -> Result<(), UploadFailure> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(u64, u64)>();
    let progress = Box::new(move |sent: u64, total: u64| {
        let _ = tx.send((sent, total));
    });

    let work = async {
        let directory = if target.preserve_folders && !item.directory_segments().is_empty() {
            directories
                .ensure_path(target.backend, &item.relative_path)
                .await
        } else {
            target.scope.directory
        };

        let request = UploadRequest {
            module_type: target.module_type.clone(),
            repository: target.scope.repository,
            module: target.scope.module,
            directory,
            file: item.file.clone(),
        };
        target.backend.upload(request, progress).await
    };
    tokio::pin!(work);

    let mut progress_open = true;
    loop {
        tokio::select! {
            biased;

            // Dropping `work` aborts the in-flight request.
            _ = token.cancelled() => return Err(UploadFailure::Cancelled),

            update = rx.recv(), if progress_open => match update {
                Some((sent, total)) => {
                    if queue.update_progress(&item.id, percent(sent, total)) {
                        if let Some(current) = queue.get(&item.id) {
                            observer.item_progress(current);
                        }
                    }
                }
                None => progress_open = false,
            },

            result = &mut work => return result.map_err(UploadFailure::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::admit;
    use crate::test_helpers::MockBackend;
    use archivo_core::{BackendError, IntakeEntry, SessionOptions, SourceFile, UploadStatus};
    use std::path::PathBuf;

    fn entry(path: &str) -> IntakeEntry {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        IntakeEntry {
            file: SourceFile {
                path: PathBuf::from("/tmp").join(&name),
                name,
                size: 1000,
            },
            relative_path: path.to_string(),
        }
    }

    struct Fixture {
        backend: MockBackend,
        queue: UploadQueue,
        index: ExistingAssetIndex,
        directories: DirectoryMaterializer,
        control: BatchControl,
        scope: Scope,
    }

    impl Fixture {
        fn new(paths: &[&str]) -> Self {
            let scope = Scope::new(1, Some(2), None);
            let mut index = ExistingAssetIndex::new();
            let ticket = index.begin(scope);
            index.apply(ticket, Ok(Vec::new())).unwrap();
            let mut queue = UploadQueue::new();
            admit(
                &mut queue,
                &index,
                paths.iter().map(|p| entry(p)).collect(),
                &SessionOptions::default(),
            )
            .unwrap();
            Self {
                backend: MockBackend::new(),
                queue,
                index,
                directories: DirectoryMaterializer::new(&scope),
                control: BatchControl::new(),
                scope,
            }
        }

        async fn run(&mut self, preserve_folders: bool) -> Result<BatchReport, SchedulerError> {
            self.run_with(preserve_folders, &NoopObserver).await
        }

        async fn run_with(
            &mut self,
            preserve_folders: bool,
            observer: &dyn UploadObserver,
        ) -> Result<BatchReport, SchedulerError> {
            let target = BatchTarget {
                backend: &self.backend,
                scope: self.scope,
                module_type: ModuleType::Broadcast,
                preserve_folders,
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

    /// Cancels the run as soon as the first item reaches a terminal state.
    struct CancelAfterFirst(BatchControl);

    impl UploadObserver for CancelAfterFirst {
        fn item_finished(&self, _item: &UploadItem) {
            self.0.cancel();
        }
    }

    #[tokio::test]
    async fn uploads_all_pending_items_and_grows_index() {
        let mut fx = Fixture::new(&["a.mp4", "b.mp4"]);

        let report = fx.run(true).await.unwrap();

        assert_eq!(report.outcome, BatchOutcome::Completed);
        assert_eq!(report.completed, 2);
        assert!(fx
            .queue
            .items()
            .iter()
            .all(|i| i.status == UploadStatus::Completed && i.progress == 100));
        assert!(fx.index.contains(&archivo_core::DuplicateKey::from_name("A.MP4")));
        assert_eq!(fx.control.state(), BatchState::Completed);
        assert!(!fx.control.cancel());
    }

    #[tokio::test]
    async fn server_failure_does_not_stop_the_batch() {
        let mut fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
        fx.backend.fail_upload(
            "b.mp4",
            BackendError::status(
                400,
                Some("duplicate_file".to_string()),
                Some("Ya existe".to_string()),
            ),
        );

        let report = fx.run(true).await.unwrap();

        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 1);
        let b = &fx.queue.items()[1];
        assert_eq!(b.status, UploadStatus::Error);
        assert_eq!(b.error.as_deref(), Some("Ya existe"));
        assert_eq!(fx.queue.items()[2].status, UploadStatus::Completed);
    }

    #[tokio::test]
    async fn folders_are_ignored_when_not_preserved() {
        let mut fx = Fixture::new(&["Ads/Q1/spot.mp4"]);

        fx.run(false).await.unwrap();

        assert_eq!(fx.backend.calls().directory_calls(), 0);
        assert_eq!(fx.backend.uploads()[0].directory, None);
    }

    #[tokio::test]
    async fn empty_queue_is_reported() {
        let mut fx = Fixture::new(&[]);
        assert_eq!(fx.run(true).await, Err(SchedulerError::NothingPending));
        assert_eq!(fx.control.state(), BatchState::Idle);
    }

    #[tokio::test]
    async fn second_run_is_refused_while_one_is_armed() {
        let mut fx = Fixture::new(&["a.mp4"]);
        let token = fx.control.arm().unwrap();
        token.cancel();
        assert_eq!(fx.run(true).await, Err(SchedulerError::AlreadyRunning));

        fx.control.finish(BatchOutcome::Cancelled);
        assert_eq!(fx.queue.items()[0].status, UploadStatus::Pending);
    }

    #[tokio::test]
    async fn cancel_between_items_leaves_the_rest_pending() {
        let mut fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
        let observer = CancelAfterFirst(fx.control.clone());

        let report = fx.run_with(true, &observer).await.unwrap();

        assert_eq!(report.outcome, BatchOutcome::Cancelled);
        assert_eq!(report.completed, 1);
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.not_started, 2);

        let items = fx.queue.items();
        assert_eq!(items[0].status, UploadStatus::Completed);
        assert!(items[1..]
            .iter()
            .all(|i| i.status == UploadStatus::Pending && i.error.is_none()));
        assert_eq!(fx.backend.calls().upload, 1);
        assert_eq!(fx.control.state(), BatchState::Cancelled);
    }

    #[test]
    fn percent_rounds_and_clamps() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 4), 100);
        assert_eq!(percent(250, 1000), 25);
    }
}
