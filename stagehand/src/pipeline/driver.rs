//! Runs a resolved stage route.
//!
//! A run moves through `Init → {DryRun | Running} → Emitting → Done`. A stage
//! failure during `Running` aborts the run before anything is emitted.

use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{construct_path, Registry, RunOptions};
use crate::config::StagehandConfig;
use crate::core::{Artifact, RepresentationKind};
use crate::errors::{Result, StagehandError};
use crate::observability::{overall_report, Progress, ProfilingRequest, SpanTimer};
use crate::stages::{stage_label, Stage};

/// Header printed before a dry run.
pub const DRY_RUN_HEADER: &str = "stagehand will perform the following steps:";

/// The artifact and timings left after every stage ran.
#[derive(Debug)]
pub struct Execution {
    /// The last stage's output.
    pub artifact: Artifact,
    /// Wall time of each stage in seconds, in route order.
    pub durations: Vec<f64>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Stages were listed, nothing ran.
    DryRun,
    /// Every stage ran and the result was emitted.
    Completed {
        /// `(stage name, seconds)` per stage, in route order.
        stage_durations: Vec<(String, f64)>,
    },
}

/// An ordered list of stages and the options to run them with.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    options: RunOptions,
}

impl Pipeline {
    /// Resolves the route for `options` and takes its stages from `registry`.
    ///
    /// # Errors
    ///
    /// Returns a resolution error when the input file is missing, the route
    /// cannot be built, or a directory result has nowhere to go.
    pub fn resolve(options: RunOptions, config: &StagehandConfig, registry: Registry) -> Result<Self> {
        check_input(&options)?;
        let ids = construct_path(&options, config, &registry)?;
        Self::from_stages(registry.into_stages(&ids), options)
    }

    /// Wraps an already resolved route.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::NeedOutputSpecified`] if the last stage
    /// produces a directory and no output file is set, and
    /// [`StagehandError::FileNotFound`] for a missing input file.
    pub fn from_stages(stages: Vec<Box<dyn Stage>>, options: RunOptions) -> Result<Self> {
        check_input(&options)?;
        if let Some(last) = stages.last() {
            if last.output_kind() == RepresentationKind::Directory && options.output.is_none() {
                return Err(StagehandError::NeedOutputSpecified {
                    stage: last.name().to_string(),
                });
            }
        }
        Ok(Self { stages, options })
    }

    /// The stages in route order.
    pub fn stages(&self) -> impl Iterator<Item = &dyn Stage> {
        self.stages.iter().map(|s| &**s as &dyn Stage)
    }

    /// The options this pipeline runs with.
    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Writes each stage's name and description without running anything.
    pub fn dry_run(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{DRY_RUN_HEADER}")?;
        for stage in &self.stages {
            writeln!(out, "Stage: {}", stage.name())?;
            stage.dry_run(out)?;
        }
        Ok(())
    }

    /// Runs every stage in order, handing each one the previous output.
    ///
    /// The artifact is converted to a stage's input kind just before that
    /// stage runs, when both kinds are concrete and differ.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. `progress` is left in the failed
    /// state and no later stage runs.
    pub fn execute(&mut self, progress: &mut dyn Progress) -> Result<Execution> {
        let mut artifact = match self.options.input_path() {
            Some(path) => Artifact::path(path),
            None => Artifact::Untyped,
        };
        let mut durations = Vec::with_capacity(self.stages.len());

        for stage in &mut self.stages {
            let label = stage_label(stage.as_ref());
            progress.start_stage(&label);
            info!(stage = %stage.name(), label = %label, "Stage started");

            let suppress = stage.suppresses_progress();
            if suppress {
                progress.stop();
            }

            let sink: Option<&mut dyn Progress> = if suppress { Some(&mut *progress) } else { None };
            let timer = SpanTimer::start(stage.name());
            match run_stage(stage.as_mut(), artifact, sink) {
                Ok(next) => {
                    let secs = timer.finish();
                    info!(stage = %stage.name(), duration_ms = secs * 1000.0, "Stage finished");
                    durations.push(secs);
                    artifact = next;
                    progress.end_stage();
                }
                Err(err) => {
                    warn!(stage = %stage.name(), error = %err, "Stage failed");
                    progress.fail(None);
                    return Err(err);
                }
            }
        }
        progress.stop();

        Ok(Execution { artifact, durations })
    }

    /// Replaces the artifact with a profiling report if one was requested.
    ///
    /// An empty token list selects the per-stage table. Otherwise each
    /// requested stage is gathered from the stages that ran.
    ///
    /// # Errors
    ///
    /// Returns a profiling-request error naming the unknown stage or steps.
    pub fn profile(&self, execution: Execution) -> Result<Execution> {
        let Some(tokens) = &self.options.profile else {
            return Ok(execution);
        };
        let format = self.options.report_format();
        let executed: Vec<&dyn Stage> = self.stages().collect();

        let report = if tokens.is_empty() {
            overall_report(&executed, &execution.durations, format)
        } else {
            let request = ProfilingRequest::parse(tokens.as_slice());
            let collected: Vec<&dyn Stage> = executed
                .into_iter()
                .filter(|s| request.contains_stage(s.name()))
                .collect();
            request.report(&collected, format)?
        };

        Ok(Execution {
            artifact: Artifact::String(report),
            durations: execution.durations,
        })
    }

    /// Writes the artifact to the output file, or prints it to `out`.
    ///
    /// # Errors
    ///
    /// Returns conversion and I/O errors.
    pub fn emit(&self, artifact: Artifact, out: &mut dyn Write) -> Result<()> {
        emit(artifact, self.options.output_path(), out)
    }

    /// Runs the whole pipeline: dry run, or execute, profile and emit.
    ///
    /// # Errors
    ///
    /// Returns the first error from any phase.
    pub fn run(mut self, progress: &mut dyn Progress, out: &mut dyn Write) -> Result<RunOutcome> {
        if self.options.dry_run {
            self.dry_run(out)?;
            return Ok(RunOutcome::DryRun);
        }

        let execution = self.execute(progress)?;
        let execution = self.profile(execution)?;

        let stage_durations = self
            .stages
            .iter()
            .map(|s| s.name().to_string())
            .zip(execution.durations.iter().copied())
            .collect();
        self.emit(execution.artifact, out)?;

        Ok(RunOutcome::Completed { stage_durations })
    }
}

/// Resolves and runs a pipeline.
///
/// # Errors
///
/// Returns resolution, execution, profiling and emission errors.
pub fn run(
    options: RunOptions,
    config: &StagehandConfig,
    registry: Registry,
    progress: &mut dyn Progress,
    out: &mut dyn Write,
) -> Result<RunOutcome> {
    Pipeline::resolve(options, config, registry)?.run(progress, out)
}

fn check_input(options: &RunOptions) -> Result<()> {
    match options.input_path() {
        Some(path) if !path.exists() => Err(StagehandError::FileNotFound(path.to_path_buf())),
        _ => Ok(()),
    }
}

fn run_stage(
    stage: &mut dyn Stage,
    artifact: Artifact,
    progress: Option<&mut dyn Progress>,
) -> Result<Artifact> {
    let wanted = stage.input_kind();
    let have = artifact.kind();
    let artifact = if have.is_concrete() && wanted.is_concrete() && have != wanted {
        debug!(stage = %stage.name(), from = %have, to = %wanted, "Converting artifact");
        artifact.convert_to(wanted)?
    } else {
        artifact
    };
    stage.run(artifact, progress)
}

fn emit(artifact: Artifact, output: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    match output {
        Some(dest) => match artifact {
            Artifact::Directory(dir) => {
                debug!(from = %dir.path().display(), to = %dest.display(), "Moving directory");
                dir.move_to(dest)?;
            }
            other => {
                debug!(to = %dest.display(), "Writing output");
                fs::write(dest, other.into_bytes()?)?;
            }
        },
        None => {
            if !artifact.is_untyped() {
                writeln!(out, "{}", artifact.into_string()?)?;
            }
        }
    }
    Ok(())
}
