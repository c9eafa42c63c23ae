//! Logging, timing, progress reporting and profiling reports.

mod logging;
mod profiling;
mod progress;
mod timer;

pub use logging::{init_logging, Verbosity, LOG_ENV};
pub use profiling::{
    format_seconds, overall_report, render, ProfilingRequest, ReportFormat, StageProfile,
    OVERALL_LABEL,
};
pub use progress::{NoProgress, Progress, StatusLine};
pub use timer::SpanTimer;
