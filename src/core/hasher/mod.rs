//! # Hasher Module
//!
//! Content fingerprints used by the dedup check.
//!
//! A [`Fingerprint`] is the SHA-256 digest of a file's full byte content,
//! computed by streaming the file once. Two files are considered the same
//! photo only when their fingerprints are equal.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Digest of a file's full content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Digest everything `reader` yields
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Self(hasher.finalize().into()))
    }

    /// Open `path` on its own handle and digest it
    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let file = File::open(path).map_err(|source| MetadataError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Digest an in-memory buffer
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn identical_content_has_equal_fingerprints() {
        let a = Fingerprint::from_bytes(b"the same bytes");
        let b = Fingerprint::from_reader(&b"the same bytes"[..]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn appended_byte_changes_fingerprint() {
        let a = Fingerprint::from_bytes(b"photo payload");
        let b = Fingerprint::from_bytes(b"photo payload!");
        assert_ne!(a, b);
    }

    #[test]
    fn file_and_buffer_digests_agree() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        // Larger than one chunk so the streaming loop runs more than once
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        File::create(&path).unwrap().write_all(&content).unwrap();

        let from_file = Fingerprint::from_path(&path).unwrap();
        assert_eq!(from_file, Fingerprint::from_bytes(&content));
    }

    #[test]
    fn missing_file_reports_open_error() {
        let result = Fingerprint::from_path(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(MetadataError::Open { .. })));
    }

    #[test]
    fn display_is_lowercase_hex() {
        let text = Fingerprint::from_bytes(b"").to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("e3b0c442"));
    }
}
