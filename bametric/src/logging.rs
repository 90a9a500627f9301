//! Tracing subscriber setup.
//!
//! Logs go to stderr so that `view` and `export` output on stdout stays
//! clean. `RUST_LOG` directives are honoured on top of the chosen level.

use bametric_common::config::LogLevel;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

/// Map a settings level onto `tracing`.
pub fn to_tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing
/// one is kept.
pub fn setup_tracing(level: LogLevel, json: bool) -> bool {
    let filter = EnvFilter::from_default_env().add_directive(to_tracing_level(level).into());

    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Keeping existing tracing subscriber: {e}");
            false
        }
    }
}
