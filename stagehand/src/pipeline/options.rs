//! Options controlling a single pipeline run.

use std::path::{Path, PathBuf};

use crate::observability::{ReportFormat, Verbosity};

/// What to run and how.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// The input file, if any.
    pub input: Option<PathBuf>,
    /// Where to write the result; stdout when absent.
    pub output: Option<PathBuf>,
    /// Explicit source stage name.
    pub from: Option<String>,
    /// Explicit target stage name.
    pub to: Option<String>,
    /// Stage names the route must pass through.
    pub through: Vec<String>,
    /// Print the resolved stages instead of running them.
    pub dry_run: bool,
    /// Suppress the progress indicator.
    pub quiet: bool,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Profiling tokens. `Some(vec![])` profiles every stage.
    pub profile: Option<Vec<String>>,
    /// Render profiling reports as CSV.
    pub csv: bool,
}

impl RunOptions {
    /// Creates options with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input file.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Sets the output file.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Sets the source stage.
    #[must_use]
    pub fn with_from(mut self, stage: impl Into<String>) -> Self {
        self.from = Some(stage.into());
        self
    }

    /// Sets the target stage.
    #[must_use]
    pub fn with_to(mut self, stage: impl Into<String>) -> Self {
        self.to = Some(stage.into());
        self
    }

    /// Adds a stage the route must pass through.
    #[must_use]
    pub fn with_through(mut self, stage: impl Into<String>) -> Self {
        self.through.push(stage.into());
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables quiet mode.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Sets the verbosity.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Requests profiling with the given tokens.
    #[must_use]
    pub fn with_profile<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profile = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Enables or disables CSV reports.
    #[must_use]
    pub fn with_csv(mut self, csv: bool) -> Self {
        self.csv = csv;
        self
    }

    /// The input file as a path.
    #[must_use]
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    /// The output file as a path.
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Whether the progress indicator should be shown.
    #[must_use]
    pub fn progress_enabled(&self) -> bool {
        !(self.verbosity.is_debug() || self.dry_run || self.quiet)
    }

    /// Whether completed stages stay visible in the progress output.
    #[must_use]
    pub fn persist_progress(&self) -> bool {
        self.verbosity.is_info()
    }

    /// The profiling report format.
    #[must_use]
    pub fn report_format(&self) -> ReportFormat {
        if self.csv {
            ReportFormat::Csv
        } else {
            ReportFormat::Human
        }
    }
}
