//! # Config Module
//!
//! Settings for a copy run, read from an optional `photo-copier.json` and
//! overridden by command-line flags.
//!
//! ## Lookup order
//! 1. The path given with `--config`
//! 2. `<config dir>/photo-copier/photo-copier.json`
//! 3. `~/photo-copier.json`
//! 4. `./photo-copier.json`
//!
//! A missing file means defaults. A file that exists but cannot be read or
//! parsed is an error.

use crate::core::classifier::{DateTemplate, DEFAULT_TEMPLATE};
use crate::core::copier::default_workers;
use crate::core::scanner::{ScanConfig, DEFAULT_EXTENSIONS};
use crate::error::{ConfigError, PhotoCopierError, TemplateError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name searched for in each lookup directory
pub const CONFIG_FILE_NAME: &str = "photo-copier.json";

/// Settings for the `copy` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// strftime layout of destination directories
    pub format: String,
    /// Walk subdirectories of the source
    pub recursive: bool,
    /// Number of copy workers
    pub workers: usize,
    /// Include dot-files and dot-directories
    pub include_hidden: bool,
    /// Extensions treated as photos
    pub extensions: Vec<String>,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_TEMPLATE.to_string(),
            recursive: true,
            workers: default_workers(),
            include_hidden: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub format: Option<String>,
    pub recursive: Option<bool>,
    pub workers: Option<usize>,
    pub include_hidden: Option<bool>,
}

impl CopyConfig {
    /// Load from `explicit` if given, otherwise from the first file found in
    /// the standard locations, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(&search_dirs()),
        };
        match path {
            Some(path) => Self::from_file(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply command-line values on top of this config
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(recursive) = overrides.recursive {
            self.recursive = recursive;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(include_hidden) = overrides.include_hidden {
            self.include_hidden = include_hidden;
        }
        self
    }

    /// Reject settings that would make the run meaningless
    pub fn validate(&self) -> Result<(), PhotoCopierError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers { value: 0 }.into());
        }
        self.template()?;
        Ok(())
    }

    pub fn template(&self) -> Result<DateTemplate, TemplateError> {
        DateTemplate::new(&self.format)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            recursive: self.recursive,
            include_hidden: self.include_hidden,
            extensions: Some(self.extensions.clone()),
            ..ScanConfig::default()
        }
    }

    /// Log the effective settings at startup
    pub fn log(&self, source: &Path, destination: &Path) {
        info!("Running with config:");
        info!(" * format = {}", self.format);
        info!(" * source = {}", source.display());
        info!(" * destination = {}", destination.display());
        info!(" * recursive = {}", self.recursive);
        info!(" * workers = {}", self.workers);
        info!(" * include_hidden = {}", self.include_hidden);
    }
}

/// Directories searched for [`CONFIG_FILE_NAME`], in priority order
pub fn search_dirs() -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Some(config) = dirs::config_dir() {
        found.push(config.join("photo-copier"));
    }
    if let Some(home) = dirs::home_dir() {
        found.push(home);
    }
    found.push(PathBuf::from("."));
    found
}

/// First existing config file in `search`
pub fn find_config_file(search: &[PathBuf]) -> Option<PathBuf> {
    search
        .iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}
