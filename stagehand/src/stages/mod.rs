//! Stage trait and implementations.
//!
//! A stage converts an artifact from one named stage (for example `c`) to
//! another (for example `object`) by running one or more named steps. Each
//! step usually wraps an external tool invocation.

mod command;
mod step;

pub use command::CommandStage;
pub use step::{Step, StepStage};

use indexmap::IndexMap;
use std::fmt::Debug;
use std::io::{self, Write};

use crate::core::{Artifact, RepresentationKind};
use crate::errors::Result;
use crate::observability::Progress;

/// Per-step wall time in seconds, in execution order.
pub type StepDurations = IndexMap<String, f64>;

/// Trait for pipeline stages.
///
/// A stage is an edge between two stage names in the registry. The driver
/// hands it the current artifact, already converted to
/// [`Stage::input_kind`], and receives the next artifact back.
pub trait Stage: Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// The stage name this stage converts from.
    fn src_stage(&self) -> &str;

    /// The stage name this stage converts to.
    fn target_stage(&self) -> &str;

    /// The representation `run` expects.
    fn input_kind(&self) -> RepresentationKind;

    /// The representation `run` produces.
    fn output_kind(&self) -> RepresentationKind;

    /// A human description, distinct from the name.
    fn description(&self) -> &str;

    /// Whether the driver should hide its progress indicator while this
    /// stage runs. Such stages receive the indicator in `run` instead.
    fn suppresses_progress(&self) -> bool {
        false
    }

    /// The declared steps, in execution order.
    fn step_names(&self) -> Vec<String>;

    /// Durations recorded by the last `run`. Empty before execution.
    fn durations(&self) -> &StepDurations;

    /// Writes a description of what `run` would do, without side effects.
    fn dry_run(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::StagehandError::StepFailure`] when an
    /// external invocation fails.
    fn run(&mut self, input: Artifact, progress: Option<&mut dyn Progress>) -> Result<Artifact>;
}

/// The label announced when a stage starts: `"<src> → <target>"`, followed
/// by `" (<name>)"` when the name differs from the source stage.
pub fn stage_label(stage: &dyn Stage) -> String {
    let mut label = format!("{} → {}", stage.src_stage(), stage.target_stage());
    if stage.name() != stage.src_stage() {
        label.push_str(&format!(" ({})", stage.name()));
    }
    label
}
