//! # Core Module
//!
//! The copy engine, independent of any user interface.
//!
//! ## Modules
//! - `metadata` - Reads the EXIF capture time of a photo
//! - `hasher` - Content fingerprints used to detect files already copied
//! - `classifier` - Maps a capture time to a destination directory
//! - `scanner` - Discovers photos in the source tree
//! - `copier` - Worker pool that performs the copies
//! - `pipeline` - Orchestrates scan then copy
//! - `transform` - Batch resize and watermark for the `resize` and
//!   `watermark` commands

pub mod classifier;
pub mod copier;
pub mod hasher;
pub mod metadata;
pub mod pipeline;
pub mod scanner;
pub mod transform;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use classifier::DateTemplate;
pub use copier::{CancellationToken, CopyReport, StatsSnapshot};
pub use hasher::Fingerprint;
pub use metadata::PhotoMetadata;
pub use scanner::Candidate;
