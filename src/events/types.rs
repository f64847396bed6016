//! Event type definitions for progress reporting.

use crate::core::copier::StatsSnapshot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while organising photos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Copy phase events
    Copy(CopyEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A photo with a usable capture time was found
    CandidateFound { path: PathBuf },
    /// A file was dropped but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed {
        total_candidates: usize,
        errors: usize,
    },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories visited so far
    pub directories_scanned: usize,
    /// Number of files accepted by the filter so far
    pub files_matched: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events during the copy phase.
///
/// Exactly one of `Copied`, `Skipped` or `Failed` is sent per candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CopyEvent {
    /// Workers are about to start on `total` candidates
    Started { total: usize },
    /// A candidate was written to its target
    Copied { target: PathBuf, bytes: u64 },
    /// An identical file already existed at the target
    Skipped { target: PathBuf },
    /// A candidate could not be copied
    Failed { target: PathBuf, message: String },
    /// All workers have stopped
    Finished { stats: StatsSnapshot },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled before every candidate was handled
    Cancelled,
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Copying,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Photos that made it through the scan
    pub total_candidates: usize,
    /// Files dropped during the scan
    pub scan_errors: usize,
    /// Final copy statistics
    pub stats: StatsSnapshot,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Copying => write!(f, "Copying"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Copy(CopyEvent::Copied {
            target: PathBuf::from("/backup/2022/2022-04-30/a.jpg"),
            bytes: 2048,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Copy(CopyEvent::Copied { bytes, .. }) => assert_eq!(bytes, 2048),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn pipeline_summary_is_serializable() {
        let summary = PipelineSummary {
            total_candidates: 10,
            scan_errors: 1,
            stats: StatsSnapshot {
                copied: 7,
                skipped: 3,
                failed: 0,
                bytes: 500_000_000,
            },
            duration_ms: 5000,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("500000000"));
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Copying.to_string(), "Copying");
    }
}
