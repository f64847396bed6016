//! # Metadata Module
//!
//! Extracts what the copier needs to know about a photo before copying it.
//!
//! ## Extracted Fields
//! - Capture time (EXIF `DateTimeOriginal`, falling back to `DateTime`)
//! - Content fingerprint (see [`crate::core::hasher`])
//!
//! The EXIF decode and the fingerprint use two independent read handles,
//! so neither depends on where the other left the file cursor.

use crate::core::hasher::Fingerprint;
use crate::error::MetadataError;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

/// Capture time and fingerprint of one photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMetadata {
    /// When the photo was taken
    pub captured_at: NaiveDateTime,
    /// Digest of the full file content
    pub fingerprint: Fingerprint,
}

/// Read the capture time and fingerprint of the photo at `path`
pub fn extract_metadata(path: &Path) -> Result<PhotoMetadata, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let captured_at = read_capture_time(&mut BufReader::new(file), path)?;
    let fingerprint = Fingerprint::from_path(path)?;

    Ok(PhotoMetadata {
        captured_at,
        fingerprint,
    })
}

/// Decode the EXIF block behind `reader` and return the capture time.
///
/// `path` is only used for error context.
pub fn read_capture_time<R: BufRead + Seek>(
    reader: &mut R,
    path: &Path,
) -> Result<NaiveDateTime, MetadataError> {
    let exif = Reader::new()
        .read_from_container(reader)
        .map_err(|e| MetadataError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let raw = [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
        .find_map(|field| ascii_value(&field.value))
        .ok_or_else(|| MetadataError::MissingCaptureTime {
            path: path.to_path_buf(),
        })?;

    parse_exif_datetime(&raw).ok_or_else(|| MetadataError::InvalidCaptureTime {
        path: path.to_path_buf(),
        value: raw,
    })
}

/// Parse an EXIF timestamp: `"YYYY:MM:DD HH:MM:SS"`.
///
/// Some cameras write dashes in the date part, so those are accepted too.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_matches(|c: char| c == '\0' || c == '"' || c.is_whitespace());
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?.trim_end_matches('\0').trim();
        if !s.is_empty() {
            return Some(s.to_string());
        }
    }
    None
}
