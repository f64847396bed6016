//! Photo files on disk for unit tests.

pub(crate) use crate::testing::{jpeg_with_capture_time, jpeg_without_exif};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) fn write_photo(dir: &Path, name: &str, taken: &str, payload: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, jpeg_with_capture_time(taken, payload)).unwrap();
    path
}
