//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, Candidate, CandidateScanner, ScanResult};
use crate::core::metadata::{extract_metadata, PhotoMetadata};
use crate::error::{MetadataError, ScanError};
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use filetime::FileTime;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Walk the full subtree instead of only the immediate children
    pub recursive: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            include_hidden: true,
            extensions: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = match config.extensions {
            Some(ref extensions) => ImageFilter::with_extensions(extensions.as_slice()),
            None => ImageFilter::new(),
        }
        .with_hidden(config.include_hidden);

        Self { config, filter }
    }

    /// Walk `root` and return every regular file the filter accepts, in walk
    /// order, together with the entries that could not be read.
    pub fn discover(
        &self,
        root: &Path,
        events: Option<&EventSender>,
    ) -> Result<(Vec<PathBuf>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| self.keep_entry(entry));

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::from(e),
                        }
                    };

                    warn!(path = %path.display(), error = %error, "unable to read entry");
                    if let Some(sender) = events {
                        sender.send(Event::Scan(ScanEvent::Error {
                            path,
                            message: error.to_string(),
                        }));
                    }
                    errors.push(error);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                directories_scanned += 1;
                if let Some(sender) = events {
                    sender.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                        directories_scanned,
                        files_matched: files.len(),
                        current_path: entry.path().to_path_buf(),
                    })));
                }
                continue;
            }

            if file_type.is_file() && self.filter.should_include(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!(
            root = %root.display(),
            directories = directories_scanned,
            files = files.len(),
            "walk finished"
        );
        Ok((files, errors))
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if self.config.include_hidden || entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        !entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    }
}

/// Stat and decode one file into a candidate
fn build_candidate(path: &Path) -> Result<Candidate, ScanError> {
    let stat = fs::metadata(path).map_err(|source| ScanError::Metadata {
        path: path.to_path_buf(),
        source: MetadataError::Open {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let PhotoMetadata {
        captured_at,
        fingerprint,
    } = extract_metadata(path).map_err(|source| ScanError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Candidate {
        source_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        file_name: path.file_name().map(|n| n.to_os_string()).unwrap_or_default(),
        captured_at,
        accessed: FileTime::from_last_access_time(&stat),
        modified: FileTime::from_last_modification_time(&stat),
        size: stat.len(),
        fingerprint,
    })
}

impl CandidateScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let (files, mut errors) = self.discover(root, Some(events))?;

        // Decoding and hashing dominate the scan, so spread them over the pool
        let results: Vec<Result<Candidate, ScanError>> = files
            .par_iter()
            .map(|path| {
                let result = build_candidate(path);
                match &result {
                    Ok(_) => events.send(Event::Scan(ScanEvent::CandidateFound {
                        path: path.clone(),
                    })),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "dropping photo");
                        events.send(Event::Scan(ScanEvent::Error {
                            path: path.clone(),
                            message: e.to_string(),
                        }));
                    }
                }
                result
            })
            .collect();

        let mut candidates = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => errors.push(e),
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_candidates: candidates.len(),
            errors: errors.len(),
        }));

        Ok(ScanResult { candidates, errors })
    }
}
