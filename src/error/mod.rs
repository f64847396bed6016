//! # Error Module
//!
//! Error types for the photo copier.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, which phase failed
//! - **Only one fatal copy error** - everything per-file is recoverable

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PhotoCopierError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while walking the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Skipping {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },
}

/// Errors that occur while reading a photo's capture time or fingerprint
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode EXIF data in {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("No capture time recorded in {path}")]
    MissingCaptureTime { path: PathBuf },

    #[error("Unreadable capture time {value:?} in {path}")]
    InvalidCaptureTime { path: PathBuf, value: String },

    #[error("Failed to read {path} while fingerprinting: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors in the destination date template. Always fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Destination template is empty")]
    Empty,

    #[error("Destination template {pattern:?} contains an unknown format specifier")]
    InvalidSpecifier { pattern: String },

    #[error("Destination template {pattern:?} must stay inside the destination directory")]
    EscapesRoot { pattern: String },
}

/// Errors that occur while dispatching or copying
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Unable to create destination directory {path}: {source}")]
    DestinationRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to create target directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to open source {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to create {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy into {path} failed: {source}")]
    Stream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to sync {path}: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to set timestamps on {path}: {source}")]
    Timestamps {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the resize and watermark transforms
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Watermark text is empty")]
    EmptyWatermark,

    #[error("Invalid watermark size {size}, expected a positive number")]
    InvalidSize { size: f32 },

    #[error("Unknown watermark color {value:?}, expected white or black")]
    UnknownColor { value: String },

    #[error("No font found, looked for {names}")]
    FontNotFound { names: String },

    #[error("Unable to load font {path}: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("Failed to load image {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to save image {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    #[error("Unable to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Worker count must be at least 1 (got {value})")]
    InvalidWorkers { value: usize },

    #[error("Missing required setting: {name}")]
    Missing { name: &'static str },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PhotoCopierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_error_includes_path() {
        let error = MetadataError::MissingCaptureTime {
            path: PathBuf::from("/photos/IMG_0001.jpg"),
        };
        assert!(error.to_string().contains("/photos/IMG_0001.jpg"));
    }

    #[test]
    fn scan_error_wraps_metadata_reason() {
        let error = ScanError::Metadata {
            path: PathBuf::from("/photos/broken.jpg"),
            source: MetadataError::Decode {
                path: PathBuf::from("/photos/broken.jpg"),
                reason: "no EXIF data".to_string(),
            },
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("no EXIF data"));
    }

    #[test]
    fn destination_root_error_converts_to_top_level() {
        let error: PhotoCopierError = CopyError::DestinationRoot {
            path: PathBuf::from("/backup"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(matches!(error, PhotoCopierError::Copy(_)));
        assert!(error.to_string().contains("/backup"));
    }
}
