//! Test fixtures: folder trees on disk.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Create `relative` (with parent folders) under `root` holding `size` bytes.
pub fn write_file(root: &Path, relative: &str, size: usize) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![0u8; size]).unwrap();
}

/// `Ads/Q1/spot1.mp4` and `Ads/Q1/spot2.mp4`.
pub fn ads_campaign() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "Ads/Q1/spot1.mp4", 4096);
    write_file(dir.path(), "Ads/Q1/spot2.mp4", 2048);
    dir
}
