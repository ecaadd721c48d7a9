//! Console plumbing for the `archivo` binary: tracing setup, progress
//! rendering and the Ctrl-C confirmation watcher.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use archivo_core::{UploadItem, UploadStatus};
use archivo_uploader::{format_file_size, BatchControl, BatchReport, UploadObserver, UploadQueue};
use tracing_subscriber::EnvFilter;

/// Second Ctrl-C must arrive within this window to confirm cancellation.
pub const CANCEL_CONFIRM_WINDOW: Duration = Duration::from_secs(5);

/// Load `.env` (or `env_file`), then build the log filter from RUST_LOG,
/// defaulting to `info`.
pub fn log_filter(env_file: Option<&Path>) -> EnvFilter {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).ok();
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing for CLI binaries. `.env` is read first so RUST_LOG
/// can be set there.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(None))
        .with_writer(std::io::stderr)
        .init();
}

/// One summary line per item: status, size, relative path and any error.
pub fn render_item(item: &UploadItem) -> String {
    let marker = match item.status {
        UploadStatus::Pending => "·",
        UploadStatus::Uploading => "↑",
        UploadStatus::Completed => "✓",
        UploadStatus::Error => "✗",
    };
    let mut line = format!(
        "{} {:<9} {:>10}  {}",
        marker,
        item.status.as_str(),
        format_file_size(item.size),
        item.relative_path
    );
    if let Some(error) = &item.error {
        line.push_str(": ");
        line.push_str(error);
    }
    line
}

pub fn render_queue(queue: &UploadQueue) -> String {
    let mut lines: Vec<String> = queue.items().iter().map(render_item).collect();
    let summary = queue.summary();
    lines.push(format!(
        "{} ({})",
        summary,
        format_file_size(summary.total_bytes)
    ));
    lines.join("\n")
}

/// Prints progress to stderr in 10% steps so large files don't flood the terminal.
#[derive(Default)]
pub struct ConsoleObserver {
    printed: Mutex<HashMap<String, u8>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `progress` crossed into a new 10% step for this item.
    fn should_print(&self, item: &UploadItem) -> bool {
        let step = item.progress / 10;
        let mut printed = self.printed.lock().unwrap_or_else(|e| e.into_inner());
        let last = printed.entry(item.id.to_string()).or_insert(0);
        if step > *last {
            *last = step;
            true
        } else {
            false
        }
    }
}

impl UploadObserver for ConsoleObserver {
    fn item_started(&self, item: &UploadItem) {
        eprintln!("Uploading {} ({})", item.relative_path, format_file_size(item.size));
    }

    fn item_progress(&self, item: &UploadItem) {
        if self.should_print(item) {
            eprintln!("  {} {}%", item.name, item.progress);
        }
    }

    fn item_finished(&self, item: &UploadItem) {
        eprintln!("{}", render_item(item));
    }

    fn batch_finished(&self, report: &BatchReport) {
        eprintln!(
            "Batch {:?}: {} completed, {} failed, {} not started",
            report.outcome, report.completed, report.failed, report.not_started
        );
    }
}

/// Cancel the running batch after a confirmed Ctrl-C (two presses within
/// `CANCEL_CONFIRM_WINDOW`). Abort the returned task once the batch ends.
pub fn spawn_cancel_watcher(control: BatchControl) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!(
                "Cancel the upload? Press Ctrl-C again within {}s to confirm.",
                CANCEL_CONFIRM_WINDOW.as_secs()
            );
            match tokio::time::timeout(CANCEL_CONFIRM_WINDOW, tokio::signal::ctrl_c()).await {
                Ok(Ok(())) => {
                    if control.cancel() {
                        eprintln!("Cancelling upload...");
                    }
                    return;
                }
                Ok(Err(_)) => return,
                Err(_) => eprintln!("Continuing upload."),
            }
        }
    })
}
