//! Stages assembled from named steps.

use std::fmt;
use std::io::{self, Write};

use super::{Stage, StepDurations};
use crate::core::{Artifact, RepresentationKind};
use crate::errors::Result;
use crate::observability::{Progress, SpanTimer};
use crate::utils::ShellRunner;

type StepFn = Box<dyn Fn(Artifact, &ShellRunner) -> Result<Artifact>>;

/// A named unit of work inside a stage.
pub struct Step {
    name: String,
    description: String,
    action: StepFn,
}

impl Step {
    /// Creates a step from a closure.
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(Artifact, &ShellRunner) -> Result<Artifact> + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            action: Box::new(action),
        }
    }

    /// Returns the step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the step description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A stage whose work is a fixed sequence of [`Step`]s.
///
/// Each step receives the previous step's output. The wall time of every
/// step is recorded under its name.
///
/// ```rust,ignore
/// let stage = StepStage::new("c", "object", RepresentationKind::Path, RepresentationKind::Stream)
///     .named("gcc")
///     .step("compile", "gcc -c", |input, shell| {
///         let path = input.into_path()?;
///         let cmd = format!("gcc -c {} -o /dev/stdout", path.as_path().display());
///         Ok(Artifact::from(shell.shell(&cmd)?))
///     });
/// ```
#[derive(Debug)]
pub struct StepStage {
    name: String,
    src_stage: String,
    target_stage: String,
    description: String,
    input_kind: RepresentationKind,
    output_kind: RepresentationKind,
    no_progress: bool,
    steps: Vec<Step>,
    durations: StepDurations,
    shell: ShellRunner,
}

impl StepStage {
    /// Creates a stage from `src_stage` to `target_stage` with no steps.
    ///
    /// The name defaults to the source stage name.
    #[must_use]
    pub fn new(
        src_stage: impl Into<String>,
        target_stage: impl Into<String>,
        input_kind: RepresentationKind,
        output_kind: RepresentationKind,
    ) -> Self {
        let src_stage = src_stage.into();
        let target_stage = target_stage.into();
        Self {
            name: src_stage.clone(),
            description: format!("{src_stage} to {target_stage}"),
            src_stage,
            target_stage,
            input_kind,
            output_kind,
            no_progress: false,
            steps: Vec::new(),
            durations: StepDurations::new(),
            shell: ShellRunner::default(),
        }
    }

    /// Sets the stage name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the shell runner handed to every step.
    #[must_use]
    pub fn with_shell(mut self, shell: ShellRunner) -> Self {
        self.shell = shell;
        self
    }

    /// Asks the driver to hide its progress indicator during this stage.
    #[must_use]
    pub fn without_progress(mut self) -> Self {
        self.no_progress = true;
        self
    }

    /// Appends a step.
    #[must_use]
    pub fn step<F>(mut self, name: impl Into<String>, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(Artifact, &ShellRunner) -> Result<Artifact> + 'static,
    {
        self.steps.push(Step::new(name, description, action));
        self
    }
}

impl Stage for StepStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn src_stage(&self) -> &str {
        &self.src_stage
    }

    fn target_stage(&self) -> &str {
        &self.target_stage
    }

    fn input_kind(&self) -> RepresentationKind {
        self.input_kind
    }

    fn output_kind(&self) -> RepresentationKind {
        self.output_kind
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn suppresses_progress(&self) -> bool {
        self.no_progress
    }

    fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }

    fn durations(&self) -> &StepDurations {
        &self.durations
    }

    fn dry_run(&self, out: &mut dyn Write) -> io::Result<()> {
        for step in &self.steps {
            writeln!(out, "  {}: {}", step.name, step.description)?;
        }
        Ok(())
    }

    fn run(&mut self, input: Artifact, mut progress: Option<&mut dyn Progress>) -> Result<Artifact> {
        self.durations.clear();
        let mut value = input;

        for step in &self.steps {
            if let Some(p) = progress.as_deref_mut() {
                p.start_step(&step.name);
            }

            let timer = SpanTimer::start(format!("{}.{}", self.name, step.name));
            value = (step.action)(value, &self.shell)?;
            self.durations.insert(step.name.clone(), timer.finish());

            if let Some(p) = progress.as_deref_mut() {
                p.end_step();
            }
        }

        if value.kind() != self.output_kind && value.kind().is_concrete() {
            value = value.convert_to(self.output_kind)?;
        }
        Ok(value)
    }
}
