//! Dispatcher: prepares the destination, fills the job queue and runs the
//! worker pool until every candidate has an outcome.

use super::worker::{CopyOutcome, Worker, WorkerContext};
use super::{CancellationToken, RunStatistics, StatsSnapshot};
use crate::core::classifier::DateTemplate;
use crate::core::scanner::Candidate;
use crate::error::CopyError;
use crate::events::{null_sender, CopyEvent, Event, EventSender};
use crossbeam_channel::{bounded, select, unbounded, Receiver};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Number of workers used when none is configured
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Configuration for the copy phase
#[derive(Debug, Clone)]
pub struct CopierConfig {
    /// Root of the date-based tree
    pub destination: PathBuf,
    /// Layout of directories under `destination`
    pub template: DateTemplate,
    /// Number of concurrent workers
    pub workers: usize,
}

impl Default for CopierConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("."),
            template: DateTemplate::default(),
            workers: default_workers(),
        }
    }
}

/// Result of a copy run
#[derive(Debug, Clone)]
pub struct CopyReport {
    /// Final counters
    pub stats: StatsSnapshot,
    /// Candidates handed to the run
    pub total: usize,
    /// Distinct target directories prepared before the workers started
    pub directories: usize,
    /// Whether the run stopped before every candidate was handled
    pub cancelled: bool,
    /// Wall-clock time of the copy phase
    pub elapsed: Duration,
}

impl CopyReport {
    /// Copied bytes per second over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.stats.bytes as f64 / secs
        } else {
            0.0
        }
    }
}

/// Builder for [`Copier`]
pub struct CopierBuilder {
    config: CopierConfig,
    cancel: Option<CancellationToken>,
}

impl CopierBuilder {
    pub fn new() -> Self {
        Self {
            config: CopierConfig::default(),
            cancel: None,
        }
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = destination.into();
        self
    }

    pub fn template(mut self, template: DateTemplate) -> Self {
        self.config.template = template;
        self
    }

    /// Set the worker count (at least one worker always runs)
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    /// Share an externally owned cancellation token, e.g. one wired to Ctrl-C
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> Copier {
        Copier {
            config: self.config,
            cancel: self.cancel.unwrap_or_default(),
        }
    }
}

impl Default for CopierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies candidates into the destination tree with a pool of workers
pub struct Copier {
    config: CopierConfig,
    cancel: CancellationToken,
}

impl Copier {
    pub fn builder() -> CopierBuilder {
        CopierBuilder::new()
    }

    pub fn config(&self) -> &CopierConfig {
        &self.config
    }

    /// Token that stops this run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run without events
    pub fn run(&self, candidates: Vec<Candidate>) -> Result<CopyReport, CopyError> {
        self.run_with_events(candidates, &null_sender())
    }

    /// Copy every candidate, reporting progress on `events`.
    ///
    /// Only a destination root that cannot be created is an error; every
    /// per-file problem ends up in the `failed` counter.
    pub fn run_with_events(
        &self,
        candidates: Vec<Candidate>,
        events: &EventSender,
    ) -> Result<CopyReport, CopyError> {
        let start = Instant::now();
        let total = candidates.len();
        let stats = RunStatistics::new();

        self.ensure_destination_root()?;
        let directories = self.create_target_dirs(&candidates);

        events.send(Event::Copy(CopyEvent::Started { total }));
        info!(total, workers = self.config.workers, "starting copy");

        if total > 0 && !self.cancel.is_cancelled() {
            // Room for every candidate, so filling never waits on the workers
            let (job_tx, job_rx) = bounded(total);
            for candidate in candidates {
                if job_tx.send(candidate).is_err() {
                    break;
                }
            }
            drop(job_tx);

            let (done_tx, done_rx) = unbounded::<CopyOutcome>();
            let shutdown = CancellationToken::new();
            let ctx = WorkerContext {
                destination: &self.config.destination,
                template: &self.config.template,
                stats: &stats,
                cancel: &self.cancel,
                shutdown: &shutdown,
                events,
            };

            thread::scope(|scope| {
                for id in 0..self.config.workers {
                    let worker = Worker::new(id, &ctx);
                    let jobs = job_rx.clone();
                    let done = done_tx.clone();
                    scope.spawn(move || worker.run(jobs, done));
                }
                drop(done_tx);

                self.await_completion(total, &done_rx);
                // In-flight copies finish before their worker sees this
                shutdown.cancel();
                debug!("waiting for workers to stop");
            });
        }

        let stats = stats.snapshot();
        let cancelled = stats.processed() < total;
        events.send(Event::Copy(CopyEvent::Finished { stats }));

        Ok(CopyReport {
            stats,
            total,
            directories,
            cancelled,
            elapsed: start.elapsed(),
        })
    }

    /// Block until one outcome per candidate has arrived, cancellation fires,
    /// or every worker is gone.
    fn await_completion(&self, total: usize, done: &Receiver<CopyOutcome>) {
        let mut finished = 0;
        while finished < total {
            select! {
                recv(done) -> outcome => match outcome {
                    Ok(_) => finished += 1,
                    Err(_) => break,
                },
                recv(self.cancel.receiver()) -> _ => {
                    info!(finished, total, "copy cancelled");
                    break;
                }
            }
        }
    }

    /// Create each distinct target directory once. Failures are logged; the
    /// affected copies fail later when their file cannot be created.
    fn create_target_dirs(&self, candidates: &[Candidate]) -> usize {
        let dirs: BTreeSet<PathBuf> = candidates
            .iter()
            .map(|c| {
                self.config
                    .template
                    .derive(&self.config.destination, &c.captured_at)
            })
            .collect();

        let mut created = 0;
        for dir in &dirs {
            debug!(path = %dir.display(), "creating directory");
            match fs::create_dir_all(dir) {
                Ok(()) => created += 1,
                Err(source) => {
                    let e = CopyError::CreateDirectory {
                        path: dir.clone(),
                        source,
                    };
                    error!("{e}");
                }
            }
        }
        created
    }

    fn ensure_destination_root(&self) -> Result<(), CopyError> {
        let root = &self.config.destination;
        if root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(root).map_err(|source| CopyError::DestinationRoot {
            path: root.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::write_photo;
    use crate::core::scanner::{CandidateScanner, ScanConfig, WalkDirScanner};
    use crate::events::EventChannel;
    use tempfile::TempDir;

    fn scan(dir: &std::path::Path) -> Vec<Candidate> {
        WalkDirScanner::new(ScanConfig::default())
            .scan(dir)
            .unwrap()
            .candidates
    }

    fn copier(destination: &std::path::Path, workers: usize) -> Copier {
        Copier::builder()
            .destination(destination)
            .template("%Y-%m-%d".parse().unwrap())
            .workers(workers)
            .build()
    }

    #[test]
    fn builder_clamps_workers_to_one() {
        let copier = Copier::builder().workers(0).build();
        assert_eq!(copier.config().workers, 1);
    }

    #[test]
    fn creates_one_directory_per_date() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_photo(src.path(), "img001.jpg", "2022:04:30 08:00:00", b"1");
        write_photo(src.path(), "img002.jpg", "2022:03:29 08:00:00", b"2");
        write_photo(src.path(), "img003.jpg", "2022:03:29 18:00:00", b"3");

        let report = copier(dst.path(), 2).run(scan(src.path())).unwrap();

        assert_eq!(report.directories, 2);
        assert!(dst.path().join("2022-04-30").join("img001.jpg").is_file());
        assert!(dst.path().join("2022-03-29").join("img002.jpg").is_file());
        assert!(dst.path().join("2022-03-29").join("img003.jpg").is_file());
    }

    #[test]
    fn stats_account_for_every_candidate() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for i in 0..20 {
            write_photo(
                src.path(),
                &format!("img{i:03}.jpg"),
                "2021:07:04 12:00:00",
                format!("payload {i}").as_bytes(),
            );
        }
        let candidates = scan(src.path());
        let expected_bytes: u64 = candidates.iter().map(|c| c.size).sum();

        let report = copier(dst.path(), 4).run(candidates).unwrap();

        assert_eq!(report.stats.copied + report.stats.skipped, 20);
        assert_eq!(report.stats.bytes, expected_bytes);
        assert!(!report.cancelled);
    }

    #[test]
    fn empty_run_creates_only_the_root() {
        let dst = TempDir::new().unwrap();
        let root = dst.path().join("library");

        let report = copier(&root, 2).run(Vec::new()).unwrap();

        assert_eq!(report.stats, StatsSnapshot::default());
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn unusable_destination_root_is_fatal() {
        let dst = TempDir::new().unwrap();
        let blocker = dst.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = copier(&blocker.join("library"), 1).run(Vec::new());

        assert!(matches!(result, Err(CopyError::DestinationRoot { .. })));
    }

    #[test]
    fn cancelled_before_start_copies_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_photo(src.path(), "a.jpg", "2022:04:30 08:00:00", b"1");
        let copier = copier(dst.path(), 2);
        copier.cancellation_token().cancel();

        let report = copier.run(scan(src.path())).unwrap();

        assert_eq!(report.stats.processed(), 0);
        assert!(report.cancelled);
        assert!(!dst.path().join("2022-04-30").join("a.jpg").exists());
    }

    #[test]
    fn emits_one_event_per_candidate() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for i in 0..5 {
            write_photo(src.path(), &format!("{i}.jpg"), "2022:04:30 08:00:00", &[i]);
        }
        let (sender, receiver) = EventChannel::new();

        copier(dst.path(), 3)
            .run_with_events(scan(src.path()), &sender)
            .unwrap();
        drop(sender);

        let per_file = receiver
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Copy(CopyEvent::Copied { .. } | CopyEvent::Skipped { .. })
                )
            })
            .count();
        assert_eq!(per_file, 5);
    }

    #[test]
    fn completed_run_leaves_the_callers_token_untouched() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_photo(src.path(), "a.jpg", "2022:04:30 08:00:00", b"1");
        let token = CancellationToken::new();
        let copier = Copier::builder()
            .destination(dst.path())
            .cancellation(token.clone())
            .build();

        copier.run(scan(src.path())).unwrap();

        assert!(!token.is_cancelled());
    }

    #[test]
    fn throughput_is_zero_without_elapsed_time() {
        let report = CopyReport {
            stats: StatsSnapshot::default(),
            total: 0,
            directories: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.throughput(), 0.0);
    }
}
