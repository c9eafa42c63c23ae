//! Error types for the stagehand pipeline executor.
//!
//! Errors fall into five groups:
//! - resolution errors, raised before any stage runs
//! - step failures, raised by external tool invocations
//! - profiling-request errors, raised after execution
//! - conversion errors between artifact representations
//! - configuration and I/O errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::RepresentationKind;

/// Placeholder reported for stdout when output was not captured.
pub const NO_STDOUT_CAPTURED: &str = "No stdout captured.";

/// Placeholder reported for stderr when output was not captured.
pub const NO_STDERR_CAPTURED: &str = "No stderr captured.";

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StagehandError>;

/// The main error type for stagehand operations.
#[derive(Debug, Error)]
pub enum StagehandError {
    /// No input file was given and no source stage was named.
    #[error("No input file provided. Provide an input file or a source stage with --from.{}", format_dests(.possible_dests))]
    NoInputFile {
        /// Stages that could have been reached, shown as a hint.
        possible_dests: Vec<String>,
    },

    /// No output file was given and no target stage was named.
    #[error("No output file provided. Provide an output file or a target stage with --to.")]
    NoOutputFile,

    /// The file extension does not map to any known stage.
    #[error("`{}' does not have an extension associated with any stage. Use --from or --to to name the stage explicitly.", .filename.display())]
    UnknownExtension {
        /// The file whose extension was looked up.
        filename: PathBuf,
    },

    /// The registry has no route between the two stages.
    #[error("No way to convert input in stage `{source_stage}' to stage `{target_stage}'{}", format_through(.through))]
    NoPathFound {
        /// The source stage.
        source_stage: String,
        /// The target stage.
        target_stage: String,
        /// Stages the path was required to go through.
        through: Vec<String>,
    },

    /// The resolved path would not execute anything.
    #[error("The input and output stage are both `{stage}'; nothing would be executed")]
    TrivialPath {
        /// The stage that is both source and target.
        stage: String,
    },

    /// The final stage produces a directory but no destination was named.
    #[error("Stage `{stage}' produces a directory; an output destination is required (use -o)")]
    NeedOutputSpecified {
        /// The stage producing the directory.
        stage: String,
    },

    /// An explicitly named input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A stage name was referenced that the registry does not know.
    #[error("Unknown stage: `{0}'")]
    UnknownStage(String),

    /// An external invocation exited with a non-zero status.
    #[error(transparent)]
    StepFailure(#[from] StepFailure),

    /// A profiling request named a stage that was not executed.
    #[error("`{stage}' is not a stage that was executed in this pipeline")]
    UndefinedStage {
        /// The offending stage name.
        stage: String,
    },

    /// A profiling request named steps the stage does not declare.
    #[error("`{stage}' does not define the step(s): {}", .steps.join(", "))]
    UndefinedSteps {
        /// The stage that was queried.
        stage: String,
        /// Every unrecognised step.
        steps: Vec<String>,
    },

    /// A declared step has no recorded duration.
    #[error("Step `{step}' of stage `{stage}' did not record a duration")]
    UnmeasuredStep {
        /// The stage that was queried.
        stage: String,
        /// The step with no measurement.
        step: String,
    },

    /// A path was converted to a directory but is not one.
    #[error("`{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// No chain of conversion edges connects the two kinds.
    #[error("No conversion path from {from} to {to}")]
    NoConversionPath {
        /// The kind being converted from.
        from: RepresentationKind,
        /// The kind being converted to.
        to: RepresentationKind,
    },

    /// Bytes could not be decoded as UTF-8.
    #[error("Artifact is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A configuration value is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A command template could not be rendered.
    #[error("Template error in `{template}': {message}")]
    Template {
        /// The template text.
        template: String,
        /// What went wrong.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagehandError {
    /// Creates a no-path-found error.
    #[must_use]
    pub fn no_path_found(
        source_stage: impl Into<String>,
        target_stage: impl Into<String>,
        through: &[String],
    ) -> Self {
        Self::NoPathFound {
            source_stage: source_stage.into(),
            target_stage: target_stage.into(),
            through: through.to_vec(),
        }
    }

    /// Creates an undefined stage error.
    #[must_use]
    pub fn undefined_stage(stage: impl Into<String>) -> Self {
        Self::UndefinedStage {
            stage: stage.into(),
        }
    }

    /// Creates an undefined steps error.
    #[must_use]
    pub fn undefined_steps(stage: impl Into<String>, steps: Vec<String>) -> Self {
        Self::UndefinedSteps {
            stage: stage.into(),
            steps,
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error was detected before any stage ran.
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::NoInputFile { .. }
                | Self::NoOutputFile
                | Self::UnknownExtension { .. }
                | Self::NoPathFound { .. }
                | Self::TrivialPath { .. }
                | Self::NeedOutputSpecified { .. }
                | Self::FileNotFound(_)
                | Self::UnknownStage(_)
        )
    }
}

fn format_dests(dests: &[String]) -> String {
    if dests.is_empty() {
        String::new()
    } else {
        format!(" Possible source stages: {}", dests.join(", "))
    }
}

fn format_through(through: &[String]) -> String {
    if through.is_empty() {
        String::new()
    } else {
        format!(" through {}", through.join(", "))
    }
}

/// Failure of a single external invocation.
///
/// Carries the command text and whatever output was captured. When capture
/// was skipped the output fields hold [`NO_STDOUT_CAPTURED`] and
/// [`NO_STDERR_CAPTURED`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct StepFailure {
    /// The command text that was run.
    pub command: String,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl StepFailure {
    /// Creates a step failure with captured output.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a step failure for a command whose output was not captured.
    #[must_use]
    pub fn uncaptured(command: impl Into<String>) -> Self {
        Self::new(command, NO_STDOUT_CAPTURED, NO_STDERR_CAPTURED)
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "`{}' failed:", self.command)?;
        writeln!(f, "=====STDERR=====")?;
        writeln!(f, "{}", self.stderr)?;
        writeln!(f, "=====STDOUT=====")?;
        write!(f, "{}", self.stdout)
    }
}
