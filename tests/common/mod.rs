//! Shared fixtures for integration tests.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use photo_copier::testing::jpeg_with_capture_time;
use std::path::{Path, PathBuf};

/// Write a photo taken at `taken` under `dir/name`
pub fn photo(dir: &TempDir, name: &str, taken: &str, payload: &[u8]) {
    dir.child(name)
        .write_binary(&jpeg_with_capture_time(taken, payload))
        .unwrap();
}

/// Every regular file under `dir`, as paths relative to it, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}
