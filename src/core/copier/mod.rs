//! # Copier Module
//!
//! Copies scanned photos into the date-based destination tree.
//!
//! ## Flow
//! 1. The dispatcher creates every distinct target directory once
//! 2. All candidates go onto a job queue that is then closed
//! 3. N workers drain the queue, each skipping files whose content is
//!    already present at the target
//! 4. The dispatcher waits for one outcome per candidate, or cancellation,
//!    then stops the workers
//!
//! ## Cancellation
//! A [`CancellationToken`] stops workers from starting new copies. A copy
//! already in progress always completes.

mod cancel;
mod executor;
mod stats;
mod worker;

pub use cancel::CancellationToken;
pub use executor::{default_workers, Copier, CopierBuilder, CopierConfig, CopyReport};
pub use stats::{RunStatistics, StatsSnapshot};
pub use worker::CopyOutcome;
