//! Logging setup for the `maintrack` binary.
//!
//! Diagnostics are written to stderr through `tracing`; stdout is reserved for
//! command results so they can be piped into other tools.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the computed filter.
pub const LOG_ENV: &str = "RUST_LOG";

/// How much diagnostic output a command produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only (`--quiet`).
    Quiet,
    /// Warnings, e.g. a collection that failed to decode and was reset.
    #[default]
    Normal,
    /// Store mutations and lookups (`-v`).
    Verbose,
    /// Everything (`-vv`).
    Trace,
}

impl Verbosity {
    /// The most detailed level emitted at this verbosity.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive scoping this verbosity to the maintrack crate.
    #[must_use]
    pub fn directive(self) -> String {
        format!("maintrack={}", self.level())
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbosity` when it is set and parses. Calling this
/// more than once is harmless; later calls are ignored.
///
/// # Examples
///
/// ```no_run
/// use maintrack::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= Verbosity::Verbose)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

/// Route log output through the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("maintrack=debug")
        .with_test_writer()
        .try_init();
}
