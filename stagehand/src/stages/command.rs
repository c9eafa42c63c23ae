//! Stages declared in configuration as shell command templates.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use tracing::debug;

use super::{Stage, StepDurations};
use crate::config::{CommandOutput, CommandStageConfig, CommandStepConfig};
use crate::core::{Artifact, ArtifactPath, Directory, RepresentationKind};
use crate::errors::{Result, StagehandError};
use crate::observability::{Progress, SpanTimer};
use crate::utils::{placeholders, quote_arg, render, ShellRunner};

const INPUT_VAR: &str = "input";
const OUT_DIR_VAR: &str = "out_dir";

/// A stage that runs configured shell commands.
///
/// Each step's stdout becomes the next step's input. A step that names
/// `{input}` receives the current artifact as a file path; any other step
/// receives it on stdin.
#[derive(Debug)]
pub struct CommandStage {
    name: String,
    src_stage: String,
    target_stage: String,
    description: String,
    input_kind: RepresentationKind,
    output: CommandOutput,
    no_progress: bool,
    vars: HashMap<String, String>,
    steps: Vec<CommandStepConfig>,
    durations: StepDurations,
    shell: ShellRunner,
}

impl CommandStage {
    /// Builds a stage from its configuration.
    ///
    /// # Errors
    ///
    /// Returns a template error if a step uses a placeholder that has no
    /// value.
    pub fn from_config(config: &CommandStageConfig, shell: ShellRunner) -> Result<Self> {
        let name = config.stage_name().to_string();

        for step in &config.steps {
            let unknown = placeholders(&step.cmd).into_iter().find(|p| {
                let builtin = p == INPUT_VAR
                    || (p == OUT_DIR_VAR && config.output == CommandOutput::Directory);
                !builtin && !config.vars.contains_key(p)
            });
            if let Some(placeholder) = unknown {
                return Err(StagehandError::template(
                    &step.cmd,
                    format!("unknown placeholder `{{{placeholder}}}' in stage `{name}'"),
                ));
            }
        }

        Ok(Self {
            description: config
                .description
                .clone()
                .unwrap_or_else(|| format!("{} to {}", config.src, config.target)),
            name,
            src_stage: config.src.clone(),
            target_stage: config.target.clone(),
            input_kind: config.input,
            output: config.output,
            no_progress: config.no_progress,
            vars: config
                .vars
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            steps: config.steps.clone(),
            durations: StepDurations::new(),
            shell,
        })
    }

    fn run_step(
        &self,
        step: &CommandStepConfig,
        current: Artifact,
        out_dir: Option<&Directory>,
        is_last: bool,
    ) -> Result<Artifact> {
        let mut vars = self.vars.clone();
        if let Some(dir) = out_dir {
            vars.insert(OUT_DIR_VAR.to_string(), quote_arg(&dir.path().to_string_lossy()));
        }

        // Held until the command exits so temporary files stay on disk.
        let mut input_path: Option<ArtifactPath> = None;
        let mut stdin: Option<File> = None;

        if placeholders(&step.cmd).iter().any(|p| p == INPUT_VAR) {
            let path = current.convert_to(RepresentationKind::Path)?.into_path()?;
            vars.insert(
                INPUT_VAR.to_string(),
                quote_arg(&path.as_path().to_string_lossy()),
            );
            input_path = Some(path);
        } else if !current.is_untyped() {
            let path = current.convert_to(RepresentationKind::Path)?.into_path()?;
            stdin = Some(File::open(path.as_path())?);
            input_path = Some(path);
        }

        let command = render(&step.cmd, &vars)?;
        let stdout_as_debug = is_last && out_dir.is_some();
        let output = self.shell.shell_with(&command, stdin, stdout_as_debug)?;
        drop(input_path);

        Ok(Artifact::from(output))
    }
}

impl Stage for CommandStage {
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
        self.output.kind()
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
            let text = step.description.as_deref().unwrap_or(&step.cmd);
            writeln!(out, "  {}: {}", step.name, text)?;
        }
        Ok(())
    }

    fn run(&mut self, input: Artifact, mut progress: Option<&mut dyn Progress>) -> Result<Artifact> {
        self.durations.clear();
        let out_dir = match self.output {
            CommandOutput::Directory => Some(Directory::temporary()?),
            CommandOutput::Stream => None,
        };

        let mut current = input;
        let last = self.steps.len().saturating_sub(1);
        let mut recorded = StepDurations::new();

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(p) = progress.as_deref_mut() {
                p.start_step(&step.name);
            }

            let timer = SpanTimer::start(format!("{}.{}", self.name, step.name));
            current = self.run_step(step, current, out_dir.as_ref(), index == last)?;
            recorded.insert(step.name.clone(), timer.finish());

            if let Some(p) = progress.as_deref_mut() {
                p.end_step();
            }
        }
        self.durations = recorded;

        match out_dir {
            Some(dir) => {
                debug!(stage = %self.name, dir = %dir.path().display(), "Command stage produced directory");
                Ok(Artifact::from(dir))
            }
            None => Ok(current),
        }
    }
}
