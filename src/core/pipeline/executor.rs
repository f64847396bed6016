//! Pipeline execution implementation.

use crate::core::classifier::DateTemplate;
use crate::core::copier::{default_workers, CancellationToken, Copier, CopyReport};
use crate::core::scanner::{CandidateScanner, ScanConfig, WalkDirScanner};
use crate::error::{ConfigError, PhotoCopierError, ScanError};
use crate::events::{null_sender, Event, EventSender};
use crate::events::{PipelineEvent, PipelinePhase, PipelineSummary};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Photos that passed the scan
    pub total_candidates: usize,
    /// Files dropped during the scan (non-fatal)
    pub scan_errors: Vec<ScanError>,
    /// Outcome of the copy phase
    pub report: CopyReport,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            total_candidates: self.total_candidates,
            scan_errors: self.scan_errors.len(),
            stats: self.report.stats,
            duration_ms: self.duration_ms,
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tree to copy from
    pub source: Option<PathBuf>,
    /// Root of the date-based tree
    pub destination: Option<PathBuf>,
    /// Directory layout under the destination
    pub template: DateTemplate,
    /// Scanner configuration
    pub scan_config: ScanConfig,
    /// Number of copy workers
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            template: DateTemplate::default(),
            scan_config: ScanConfig::default(),
            workers: default_workers(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    cancel: Option<CancellationToken>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            cancel: None,
        }
    }

    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = Some(source.into());
        self
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(destination.into());
        self
    }

    pub fn template(mut self, template: DateTemplate) -> Self {
        self.config.template = template;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Walk subdirectories of the source
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.scan_config.recursive = recursive;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Share a cancellation token, typically one wired to Ctrl-C
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            cancel: self.cancel.unwrap_or_default(),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a source tree, then copy it into the date-based destination
pub struct Pipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, PhotoCopierError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &self,
        events: &EventSender,
    ) -> Result<PipelineResult, PhotoCopierError> {
        let source = self
            .config
            .source
            .as_deref()
            .ok_or(ConfigError::Missing { name: "source" })?;
        let destination = self
            .config
            .destination
            .as_deref()
            .ok_or(ConfigError::Missing { name: "destination" })?;
        if self.config.workers == 0 {
            return Err(ConfigError::InvalidWorkers { value: 0 }.into());
        }

        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));
        info!(source = %source.display(), "scanning");

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(source, events)?;
        let total_candidates = scan_result.candidates.len();
        info!(
            candidates = total_candidates,
            dropped = scan_result.errors.len(),
            "scan finished"
        );

        // Phase 2: Copying
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Copying,
        }));

        let copier = Copier::builder()
            .destination(destination)
            .template(self.config.template.clone())
            .workers(self.config.workers)
            .cancellation(self.cancel.clone())
            .build();
        let report = copier.run_with_events(scan_result.candidates, events)?;

        let result = PipelineResult {
            total_candidates,
            scan_errors: scan_result.errors,
            report,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        if result.report.cancelled {
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        }
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: result.summary(),
        }));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::write_photo;
    use crate::events::EventChannel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn pipeline_builder_creates_pipeline() {
        let pipeline = Pipeline::builder()
            .source("/photos")
            .destination("/backup")
            .workers(3)
            .recursive(false)
            .build();

        assert_eq!(pipeline.config().workers, 3);
        assert!(!pipeline.config().scan_config.recursive);
    }

    #[test]
    fn pipeline_requires_source_and_destination() {
        let result = Pipeline::builder().destination("/backup").build().run();
        assert!(matches!(
            result,
            Err(PhotoCopierError::Config(ConfigError::Missing { name: "source" }))
        ));
    }

    #[test]
    fn pipeline_rejects_zero_workers() {
        let result = Pipeline::builder()
            .source("/photos")
            .destination("/backup")
            .workers(0)
            .build()
            .run();
        assert!(matches!(
            result,
            Err(PhotoCopierError::Config(ConfigError::InvalidWorkers { .. }))
        ));
    }

    #[test]
    fn pipeline_handles_empty_directory() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let result = Pipeline::builder()
            .source(src.path())
            .destination(dst.path().join("out"))
            .build()
            .run()
            .unwrap();

        assert_eq!(result.total_candidates, 0);
        assert_eq!(result.report.stats.processed(), 0);
        assert!(dst.path().join("out").is_dir());
    }

    #[test]
    fn pipeline_copies_into_dated_tree() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_photo(src.path(), "img001.jpg", "2022:04:30 08:00:00", b"one");
        fs::write(src.path().join("notes.txt"), b"ignored").unwrap();

        let result = Pipeline::builder()
            .source(src.path())
            .destination(dst.path())
            .workers(2)
            .build()
            .run()
            .unwrap();

        assert_eq!(result.total_candidates, 1);
        assert_eq!(result.report.stats.copied, 1);
        assert!(dst
            .path()
            .join("2022")
            .join("2022-04-30")
            .join("img001.jpg")
            .is_file());
    }

    #[test]
    fn missing_source_is_fatal() {
        let dst = TempDir::new().unwrap();
        let result = Pipeline::builder()
            .source(dst.path().join("nope"))
            .destination(dst.path())
            .build()
            .run();

        assert!(matches!(
            result,
            Err(PhotoCopierError::Scan(ScanError::DirectoryNotFound { .. }))
        ));
    }

    #[test]
    fn pipeline_reports_phases_in_order() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_photo(src.path(), "a.jpg", "2022:04:30 08:00:00", b"a");
        let (sender, receiver) = EventChannel::new();

        Pipeline::builder()
            .source(src.path())
            .destination(dst.path())
            .build()
            .run_with_events(&sender)
            .unwrap();
        drop(sender);

        let phases: Vec<PipelinePhase> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![PipelinePhase::Scanning, PipelinePhase::Copying]);
    }
}
