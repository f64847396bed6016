//! # Photo Copier
//!
//! Copies photos from a source tree into a destination tree laid out by the
//! day each photo was taken, skipping files whose content is already there.
//!
//! ## Core Philosophy
//! - **Never touch the source** - photos are only read
//! - **Never lose a copy** - a file with the same name but different content
//!   is overwritten, an identical one is left alone
//! - **Keep going** - one unreadable photo never stops the run
//!
//! ## Architecture
//! - `core` - Scanning, date classification and the copy worker pool
//! - `config` - Config file loading and command-line overrides
//! - `events` - Event-driven progress reporting
//! - `error` - Error types, one per phase

pub mod config;
pub mod core;
pub mod error;
pub mod events;
#[doc(hidden)]
pub mod testing;

// Re-export commonly used types at the crate root
pub use error::{PhotoCopierError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the application
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug`
/// when `verbose` is set. `LOGFORMAT=json` switches to JSON lines. Calling
/// this more than once keeps the first subscriber.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = std::env::var("LOGFORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A second call finds a subscriber already installed and leaves it
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_twice_is_harmless() {
        super::init_tracing(false);
        super::init_tracing(true);
    }
}
