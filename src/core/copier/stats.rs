//! Shared run statistics.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Point-in-time copy of the run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Files written to the destination
    pub copied: usize,
    /// Files already present with identical content
    pub skipped: usize,
    /// Files that hit a copy-time error
    pub failed: usize,
    /// Bytes written for the copied files
    pub bytes: u64,
}

impl StatsSnapshot {
    /// Candidates that reached a terminal outcome
    pub fn processed(&self) -> usize {
        self.copied + self.skipped + self.failed
    }
}

/// Counters mutated by every worker.
///
/// All counters sit behind one lock so readers never see a torn update.
#[derive(Debug, Default)]
pub struct RunStatistics {
    inner: Mutex<StatsSnapshot>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_copied(&self, bytes: u64) {
        let mut stats = self.lock();
        stats.copied += 1;
        stats.bytes += bytes;
    }

    pub fn record_skipped(&self) {
        self.lock().skipped += 1;
    }

    pub fn record_failed(&self) {
        self.lock().failed += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatsSnapshot> {
        // Counters stay meaningful even if a worker panicked mid-update
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn record_copied_adds_size() {
        let stats = RunStatistics::new();
        stats.record_copied(128);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.copied, 1);
        assert_eq!(snapshot.bytes, 128);
    }

    #[test]
    fn skipped_and_failed_do_not_add_bytes() {
        let stats = RunStatistics::new();
        stats.record_skipped();
        stats.record_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.bytes, 0);
        assert_eq!(snapshot.processed(), 2);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let stats = RunStatistics::new();

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        stats.record_copied(2);
                        stats.record_skipped();
                    }
                });
            }
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.copied, 8000);
        assert_eq!(snapshot.skipped, 8000);
        assert_eq!(snapshot.bytes, 16000);
    }
}
