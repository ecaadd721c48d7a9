//! End-to-end upload workflows over real folder trees.
//!
//! Run with: `cargo test -p archivo-uploader --test workflow_test`

mod helpers;

use archivo_core::{ModuleType, SessionOptions, UploadStatus};
use archivo_uploader::intake::local::{dropped_entry, pick_folder};
use archivo_uploader::test_helpers::MockBackend;
use archivo_uploader::{IntakeSource, PickedFile};
use helpers::fixtures::{ads_campaign, write_file};
use helpers::{scope, setup_session, RecordingObserver, MODULE, REPOSITORY};

#[tokio::test]
async fn test_dropped_folder_recreates_structure_once() {
    let tree = ads_campaign();
    let backend = MockBackend::new();
    let mut session = setup_session(&backend, SessionOptions::default()).await;

    let ads = dropped_entry(&tree.path().join("Ads")).await.unwrap();
    let report = session.add(vec![IntakeSource::Dropped(vec![ads])]).await.unwrap();
    assert_eq!(report.admitted.len(), 2);
    assert!(report.messages().is_empty());

    let batch = session.start_batch(&RecordingObserver::new()).await.unwrap();
    assert_eq!(batch.completed, 2);

    let directories = backend.directories();
    assert_eq!(directories.len(), 2);
    let ads = directories.iter().find(|d| d.name == "Ads").unwrap();
    let q1 = directories.iter().find(|d| d.name == "Q1").unwrap();
    assert_eq!(ads.parent, None);
    assert_eq!(q1.parent, Some(ads.id));

    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 2);
    for upload in &uploads {
        assert_eq!(upload.directory, Some(q1.id));
        assert_eq!(upload.repository, REPOSITORY);
        assert_eq!(upload.module, Some(MODULE));
        assert_eq!(upload.module_type, ModuleType::Broadcast);
    }

    for item in session.queue().items() {
        assert_eq!(item.status, UploadStatus::Completed);
        assert_eq!(item.progress, 100);
    }

    // One lookup and one create per segment, all for the first file.
    let calls = backend.calls();
    assert_eq!(calls.list_directories, 2);
    assert_eq!(calls.create_directory, 2);
}

#[tokio::test]
async fn test_shared_prefix_costs_no_extra_directory_calls() {
    let backend = MockBackend::new();
    let mut session = setup_session(&backend, SessionOptions::default()).await;
    let tree = tempfile::tempdir().unwrap();
    write_file(tree.path(), "Campaign/2025/file.mp4", 10);
    write_file(tree.path(), "Campaign/2025/other.mp4", 10);
    write_file(tree.path(), "Campaign/2025/late.mp4", 10);

    let mut picked: Vec<PickedFile> = pick_folder(&tree.path().join("Campaign")).await.unwrap();
    let late = picked
        .iter()
        .position(|p| p.file.name == "late.mp4")
        .unwrap();
    let late = picked.remove(late);
    session
        .add(vec![IntakeSource::FolderPicker(picked)])
        .await
        .unwrap();
    session.start_batch(&RecordingObserver::new()).await.unwrap();
    let after_first_batch = backend.calls();
    assert_eq!(after_first_batch.directory_calls(), 4);

    // Later batch in the same session reuses the cached path.
    session
        .add(vec![IntakeSource::FolderPicker(vec![late])])
        .await
        .unwrap();
    session.start_batch(&RecordingObserver::new()).await.unwrap();

    assert_eq!(backend.calls().directory_calls(), 4);
    assert_eq!(backend.calls().upload, 3);
    let target = backend.uploads()[0].directory;
    assert!(backend.uploads().iter().all(|u| u.directory == target));
}

#[tokio::test]
async fn test_existing_directory_is_reused_and_flat_mode_skips_lookup() {
    let tree = ads_campaign();
    let backend = MockBackend::new();
    let existing = backend.add_directory(REPOSITORY, Some(MODULE), "ads", None);

    let mut session = setup_session(&backend, SessionOptions::default()).await;
    let ads = dropped_entry(&tree.path().join("Ads")).await.unwrap();
    session.add(vec![IntakeSource::Dropped(vec![ads])]).await.unwrap();
    session.start_batch(&RecordingObserver::new()).await.unwrap();

    let q1 = backend
        .directories()
        .into_iter()
        .find(|d| d.name == "Q1")
        .unwrap();
    assert_eq!(q1.parent, Some(existing));
    assert_eq!(backend.calls().create_directory, 1);

    let flat_backend = MockBackend::new();
    let mut flat = setup_session(
        &flat_backend,
        SessionOptions {
            preserve_folders: false,
            ..SessionOptions::default()
        },
    )
    .await;
    let ads = dropped_entry(&tree.path().join("Ads")).await.unwrap();
    flat.add(vec![IntakeSource::Dropped(vec![ads])]).await.unwrap();
    flat.start_batch(&RecordingObserver::new()).await.unwrap();

    assert_eq!(flat_backend.calls().directory_calls(), 0);
    assert!(flat_backend
        .uploads()
        .iter()
        .all(|u| u.directory == scope().directory));
}

#[tokio::test]
async fn test_redropping_uploaded_folder_skips_everything() {
    let tree = ads_campaign();
    let backend = MockBackend::new();
    let mut session = setup_session(&backend, SessionOptions::default()).await;

    let ads = dropped_entry(&tree.path().join("Ads")).await.unwrap();
    session.add(vec![IntakeSource::Dropped(vec![ads])]).await.unwrap();
    session.start_batch(&RecordingObserver::new()).await.unwrap();

    let again = dropped_entry(&tree.path().join("Ads")).await.unwrap();
    let report = session
        .add(vec![IntakeSource::Dropped(vec![again])])
        .await
        .unwrap();

    assert!(report.admitted.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert!(report.messages()[0].starts_with("The following files already exist and were skipped:"));
}
