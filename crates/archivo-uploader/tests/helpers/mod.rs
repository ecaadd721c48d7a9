//! Test helpers: sessions over the in-memory backend and real folder trees.
//!
//! Run from workspace root: `cargo test -p archivo-uploader`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use archivo_core::{Scope, SessionOptions, UploadItem, UploadStatus};
use archivo_uploader::test_helpers::MockBackend;
use archivo_uploader::{BatchControl, BatchReport, UploadObserver, UploadSession};

pub const REPOSITORY: i64 = 1;
pub const MODULE: i64 = 4;

pub fn scope() -> Scope {
    Scope::new(REPOSITORY, Some(MODULE), None)
}

/// Session with a loaded (empty unless seeded) index.
pub async fn setup_session(backend: &MockBackend, options: SessionOptions) -> UploadSession {
    let mut session = UploadSession::new(Arc::new(backend.clone()), scope(), None, options);
    session
        .refresh_index()
        .await
        .expect("index should load from the mock backend");
    session
}

/// Records every observer callback as `event:name[:progress]`.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
    reports: Mutex<Vec<BatchReport>>,
    cancel_on: Option<(String, BatchControl)>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the batch the first time `name` reports progress.
    pub fn cancelling_on(name: &str, control: BatchControl) -> Self {
        Self {
            cancel_on: Some((name.to_string(), control)),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<BatchReport> {
        self.reports.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl UploadObserver for RecordingObserver {
    fn item_started(&self, item: &UploadItem) {
        assert_eq!(item.status, UploadStatus::Uploading);
        self.push(format!("started:{}", item.name));
    }

    fn item_progress(&self, item: &UploadItem) {
        self.push(format!("progress:{}:{}", item.name, item.progress));
        if let Some((name, control)) = &self.cancel_on {
            if name == &item.name {
                control.cancel();
            }
        }
    }

    fn item_finished(&self, item: &UploadItem) {
        self.push(format!("finished:{}:{}", item.name, item.status));
    }

    fn batch_finished(&self, report: &BatchReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}
