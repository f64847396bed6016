//! # Classifier Module
//!
//! Turns a capture time into a destination directory.
//!
//! The layout is a strftime pattern where `/` separates directory levels,
//! e.g. `%Y/%Y-%m-%d` puts a photo taken on 2022-04-30 into
//! `<destination>/2022/2022-04-30`.

use crate::error::TemplateError;
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Year, then full date
pub const DEFAULT_TEMPLATE: &str = "%Y/%Y-%m-%d";

/// A validated date layout for destination directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTemplate {
    pattern: String,
}

impl DateTemplate {
    pub fn new(pattern: &str) -> Result<Self, TemplateError> {
        if pattern.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
            || !renders_without_offset(pattern)
        {
            return Err(TemplateError::InvalidSpecifier {
                pattern: pattern.to_string(),
            });
        }
        let escapes = pattern
            .split('/')
            .any(|component| component == ".." || component == ".");
        if escapes || pattern.starts_with('/') || pattern.contains('\\') {
            return Err(TemplateError::EscapesRoot {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Relative directory for `captured_at`
    pub fn render(&self, captured_at: &NaiveDateTime) -> PathBuf {
        let rendered = captured_at.format(&self.pattern).to_string();
        rendered
            .split('/')
            .filter(|component| !component.is_empty())
            .collect()
    }

    /// Directory under `root` where a photo taken at `captured_at` belongs
    pub fn derive(&self, root: &Path, captured_at: &NaiveDateTime) -> PathBuf {
        root.join(self.render(captured_at))
    }
}

/// Capture times carry no time zone, so `%z`, `%Z` and friends parse but
/// fail to format. Any date exposes them.
fn renders_without_offset(pattern: &str) -> bool {
    let Some(sample) = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return false;
    };
    let mut out = String::new();
    write!(out, "{}", sample.format(pattern)).is_ok()
}

impl Default for DateTemplate {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl FromStr for DateTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for DateTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
