//! Verbosity levels and `tracing` subscriber setup.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity-derived log filter.
pub const LOG_ENV: &str = "STAGEHAND_LOG";

/// How chatty a run is.
///
/// Verbosity is threaded explicitly through the driver and the shell runner:
/// it decides whether stderr of external tools is captured and whether the
/// progress indicator persists completed stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Only errors.
    Quiet,
    /// Warnings and errors (default).
    Warn,
    /// Informational messages.
    Info,
    /// Everything, including each shell command.
    Debug,
}

impl Verbosity {
    /// Maps a `-v` repetition count to a level.
    #[must_use]
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Returns true at debug verbosity.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        *self >= Self::Debug
    }

    /// Returns true at info verbosity or above.
    #[must_use]
    pub fn is_info(&self) -> bool {
        *self >= Self::Info
    }

    /// The `tracing` filter directive for this level.
    #[must_use]
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Warn
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `STAGEHAND_LOG` takes precedence over `verbosity` when set. Calling this
/// more than once is harmless; later calls are ignored.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("stagehand={0},stagehand_cli={0}", verbosity.as_filter())));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
