//! Copy worker: dedup check, byte copy and timestamp preservation.

use super::{CancellationToken, RunStatistics};
use crate::core::classifier::DateTemplate;
use crate::core::hasher::Fingerprint;
use crate::core::scanner::Candidate;
use crate::error::CopyError;
use crate::events::{CopyEvent, Event, EventSender};
use crossbeam_channel::{select, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Terminal outcome for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyOutcome {
    Copied { target: PathBuf, bytes: u64 },
    Skipped { target: PathBuf },
    Failed { target: PathBuf, reason: String },
}

/// Everything a worker shares with the dispatcher
pub(crate) struct WorkerContext<'a> {
    pub destination: &'a Path,
    pub template: &'a DateTemplate,
    pub stats: &'a RunStatistics,
    /// External cancellation (Ctrl-C or the caller)
    pub cancel: &'a CancellationToken,
    /// Fired by the dispatcher once every candidate has an outcome
    pub shutdown: &'a CancellationToken,
    pub events: &'a EventSender,
}

impl WorkerContext<'_> {
    fn stopping(&self) -> bool {
        self.cancel.is_cancelled() || self.shutdown.is_cancelled()
    }
}

pub(crate) struct Worker<'a> {
    id: usize,
    ctx: &'a WorkerContext<'a>,
}

impl<'a> Worker<'a> {
    pub fn new(id: usize, ctx: &'a WorkerContext<'a>) -> Self {
        Self { id, ctx }
    }

    /// Drain `jobs` until it is empty and closed or the run is cancelled,
    /// reporting each outcome on `done`.
    pub fn run(&self, jobs: Receiver<Candidate>, done: Sender<CopyOutcome>) {
        debug!(worker = self.id, "starting worker");
        loop {
            select! {
                recv(self.ctx.cancel.receiver()) -> _ => break,
                recv(self.ctx.shutdown.receiver()) -> _ => break,
                recv(jobs) -> job => {
                    let Ok(candidate) = job else { break };
                    // Several arms may be ready; never start a copy after cancellation
                    if self.ctx.stopping() {
                        break;
                    }
                    let outcome = self.process(&candidate);
                    self.report(&outcome);
                    if done.send(outcome).is_err() {
                        break;
                    }
                }
            }
        }
        debug!(worker = self.id, "stopping worker");
    }

    pub fn process(&self, candidate: &Candidate) -> CopyOutcome {
        let target = self
            .ctx
            .template
            .derive(self.ctx.destination, &candidate.captured_at)
            .join(&candidate.file_name);

        if is_duplicate(&target, &candidate.fingerprint) {
            debug!(worker = self.id, target = %target.display(), "identical file already present");
            return CopyOutcome::Skipped { target };
        }

        debug!(
            worker = self.id,
            source = %candidate.source_path().display(),
            target = %target.display(),
            "copying"
        );
        match copy_candidate(candidate, &target) {
            Ok(bytes) => CopyOutcome::Copied { target, bytes },
            Err(e) => {
                error!(worker = self.id, error = %e, "copy failed");
                CopyOutcome::Failed {
                    target,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn report(&self, outcome: &CopyOutcome) {
        let event = match outcome {
            CopyOutcome::Copied { target, bytes } => {
                self.ctx.stats.record_copied(*bytes);
                CopyEvent::Copied {
                    target: target.clone(),
                    bytes: *bytes,
                }
            }
            CopyOutcome::Skipped { target } => {
                self.ctx.stats.record_skipped();
                CopyEvent::Skipped {
                    target: target.clone(),
                }
            }
            CopyOutcome::Failed { target, reason } => {
                self.ctx.stats.record_failed();
                CopyEvent::Failed {
                    target: target.clone(),
                    message: reason.clone(),
                }
            }
        };
        self.ctx.events.send(Event::Copy(event));
    }
}

/// Whether `target` already holds content with `fingerprint`.
///
/// Any error while probing the existing file counts as "not a duplicate",
/// so the copy goes ahead instead of silently skipping.
pub(crate) fn is_duplicate(target: &Path, fingerprint: &Fingerprint) -> bool {
    if !target.is_file() {
        return false;
    }
    match Fingerprint::from_path(target) {
        Ok(existing) => existing == *fingerprint,
        Err(e) => {
            warn!(
                target = %target.display(),
                error = %e,
                "unable to fingerprint existing file, copying over it"
            );
            false
        }
    }
}

/// Stream the source into `target`, sync it and restore the source's
/// access and modification times. Returns the number of bytes written.
pub(crate) fn copy_candidate(candidate: &Candidate, target: &Path) -> Result<u64, CopyError> {
    let source_path = candidate.source_path();
    let source = candidate.open().map_err(|source| CopyError::OpenSource {
        path: source_path.clone(),
        source,
    })?;
    let file = File::create(target).map_err(|source| CopyError::CreateDestination {
        path: target.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(source);
    let mut writer = BufWriter::new(file);
    let written = io::copy(&mut reader, &mut writer)
        .and_then(|bytes| {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            Ok((bytes, file))
        })
        .map_err(|source| {
            discard_partial(target);
            CopyError::Stream {
                path: target.to_path_buf(),
                source,
            }
        });
    let (bytes, file) = written?;

    file.sync_all().map_err(|source| {
        discard_partial(target);
        CopyError::Sync {
            path: target.to_path_buf(),
            source,
        }
    })?;
    drop(file);

    filetime::set_file_times(target, candidate.accessed, candidate.modified).map_err(
        |source| CopyError::Timestamps {
            path: target.to_path_buf(),
            source,
        },
    )?;

    Ok(bytes)
}

fn discard_partial(target: &Path) {
    if let Err(e) = fs::remove_file(target) {
        warn!(target = %target.display(), error = %e, "unable to remove partial copy");
    }
}
