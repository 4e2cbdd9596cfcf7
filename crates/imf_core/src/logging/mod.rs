//! Logging set-up for IMF tools.
//!
//! The library only emits `tracing` events:
//! - `debug!` once per parsed document
//! - `info!` when a package is assembled
//! - `warn!` for anomalies that are tolerated
//!
//! Binaries install a subscriber once at start-up:
//!
//! ```no_run
//! use imf_core::logging::{init_tracing, LogLevel};
//!
//! init_tracing(LogLevel::Debug);
//! ```

mod types;

pub use types::{LogConfig, LogLevel};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber at a default level.
///
/// `RUST_LOG` takes precedence over `default_level`. Output goes to stderr.
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    init_tracing_with(&LogConfig {
        level: default_level,
        ..LogConfig::default()
    });
}

/// Initialize the global tracing subscriber from a full configuration.
pub fn init_tracing_with(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter_str()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_thread_ids(false);

    if config.show_timestamps {
        tracing_subscriber::registry().with(layer).with(filter).init();
    } else {
        tracing_subscriber::registry()
            .with(layer.without_time())
            .with(filter)
            .init();
    }
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
