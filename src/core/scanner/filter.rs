//! File filtering logic for the scanner.

use regex::Regex;
use std::path::Path;

/// Extensions recognised when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "gif", "png", "tiff"];

/// Decides which file names count as photos
#[derive(Debug, Clone)]
pub struct ImageFilter {
    /// Case-insensitive `.ext` suffix match; `None` matches nothing
    pattern: Option<Regex>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a new filter with the default extensions
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS)
    }

    /// Accept only the given extensions (without the leading dot)
    pub fn with_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        let alternatives: Vec<String> = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(regex::escape)
            .collect();

        // An empty alternation would match every dotted name
        let pattern = if alternatives.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)\.({})$", alternatives.join("|"))).ok()
        };

        Self {
            pattern,
            include_hidden: true,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file name qualifies
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(name))
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
