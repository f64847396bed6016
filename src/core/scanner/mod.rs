//! # Scanner Module
//!
//! Discovers photo files in the source tree and turns them into copy
//! [`Candidate`]s.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - GIF (.gif)
//! - TIFF (.tiff)
//!
//! Other extensions can be configured through [`ScanConfig::extensions`].
//!
//! ## Example
//! ```rust,ignore
//! use photo_copier::core::scanner::{CandidateScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/Volumes/CARD/DCIM"))?;
//! ```

mod filter;
mod walker;

pub use filter::{ImageFilter, DEFAULT_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::hasher::Fingerprint;
use crate::error::ScanError;
use crate::events::EventSender;
use chrono::NaiveDateTime;
use filetime::FileTime;
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// A discovered photo, pending a copy decision
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Directory the photo was found in
    pub source_dir: PathBuf,
    /// File name, reused unchanged at the destination
    pub file_name: OsString,
    /// When the photo was taken
    pub captured_at: NaiveDateTime,
    /// Last access time of the source
    pub accessed: FileTime,
    /// Last modification time of the source
    pub modified: FileTime,
    /// File size in bytes
    pub size: u64,
    /// Digest of the source content, computed once at scan time
    pub fingerprint: Fingerprint,
}

impl Candidate {
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.file_name)
    }

    /// Re-open the source for reading
    pub fn open(&self) -> io::Result<File> {
        File::open(self.source_path())
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Photos with a readable capture time
    pub candidates: Vec<Candidate>,
    /// Files that were dropped (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for candidate scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait CandidateScanner: Send + Sync {
    /// Scan `root` and return every qualifying photo
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(&self, root: &Path, events: &EventSender)
        -> Result<ScanResult, ScanError>;
}
