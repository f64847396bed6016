//! # Pipeline Module
//!
//! Orchestrates a full copy run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Find photos in the source tree and read their capture time
//!    and fingerprint (in parallel)
//! 2. **Copy** - Hand the candidates to the worker pool
//!
//! ## Parallelism
//! Scanning uses rayon; copying uses a fixed pool of worker threads.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
