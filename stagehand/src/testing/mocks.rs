//! Mock stages and progress sinks for testing.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use crate::core::{Artifact, Directory, RepresentationKind};
use crate::errors::{Result, StepFailure};
use crate::observability::Progress;
use crate::stages::{Stage, StepDurations};

/// File written inside the directory produced by a directory-output mock.
pub const MOCK_OUTPUT_FILE: &str = "output.txt";

/// A call log shared between mocks.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// A mock stage that records calls and tags its input with its name.
///
/// Running appends `"|<name>"` to the text of the input; an untyped input
/// yields just the name. A directory-output mock writes that text to
/// [`MOCK_OUTPUT_FILE`] in a fresh temporary directory. Step durations are
/// fixed at construction.
#[derive(Debug)]
pub struct MockStage {
    name: String,
    src_stage: String,
    target_stage: String,
    input_kind: RepresentationKind,
    output_kind: RepresentationKind,
    steps: Vec<String>,
    durations: StepDurations,
    no_progress: bool,
    fail: bool,
    log: CallLog,
}

impl MockStage {
    /// Creates a mock from `src` to `target` that works on strings.
    #[must_use]
    pub fn new(name: impl Into<String>, src: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            src_stage: src.into(),
            target_stage: target.into(),
            input_kind: RepresentationKind::String,
            output_kind: RepresentationKind::String,
            steps: Vec::new(),
            durations: StepDurations::new(),
            no_progress: false,
            fail: false,
            log: CallLog::default(),
        }
    }

    /// Sets the input and output kinds.
    #[must_use]
    pub fn with_kinds(mut self, input: RepresentationKind, output: RepresentationKind) -> Self {
        self.input_kind = input;
        self.output_kind = output;
        self
    }

    /// Declares a step with a fixed duration.
    #[must_use]
    pub fn with_step(mut self, name: impl Into<String>, secs: f64) -> Self {
        let name = name.into();
        self.durations.insert(name.clone(), secs);
        self.steps.push(name);
        self
    }

    /// Declares a step that never records a duration.
    #[must_use]
    pub fn with_unmeasured_step(mut self, name: impl Into<String>) -> Self {
        self.steps.push(name.into());
        self
    }

    /// Records calls into `log`.
    #[must_use]
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Rc::clone(log);
        self
    }

    /// Makes `run` fail with a step failure.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Asks the driver to hide its progress indicator.
    #[must_use]
    pub fn without_progress(mut self) -> Self {
        self.no_progress = true;
        self
    }

    /// The recorded calls, as `"<name>:<input kind>:<input text>"`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// The command reported by a failing mock.
    #[must_use]
    pub fn failure_command(&self) -> String {
        format!("mock {}", self.name)
    }
}

impl Stage for MockStage {
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
        "mock stage"
    }

    fn suppresses_progress(&self) -> bool {
        self.no_progress
    }

    fn step_names(&self) -> Vec<String> {
        self.steps.clone()
    }

    fn durations(&self) -> &StepDurations {
        &self.durations
    }

    fn dry_run(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "  mock: {} to {}", self.src_stage, self.target_stage)
    }

    fn run(&mut self, input: Artifact, progress: Option<&mut dyn Progress>) -> Result<Artifact> {
        let kind = input.kind();
        let text = if input.is_untyped() {
            String::new()
        } else {
            input.into_string()?
        };
        self.log
            .borrow_mut()
            .push(format!("{}:{kind}:{text}", self.name));

        if let Some(p) = progress {
            p.start_step(&self.name);
            p.end_step();
        }

        if self.fail {
            return Err(StepFailure::new(self.failure_command(), "partial", "boom").into());
        }

        let output = if kind == RepresentationKind::Untyped {
            self.name.clone()
        } else {
            format!("{text}|{}", self.name)
        };
        if self.output_kind == RepresentationKind::Directory {
            let dir = Directory::temporary()?;
            fs::write(dir.path().join(MOCK_OUTPUT_FILE), output)?;
            return Ok(Artifact::from(dir));
        }
        Artifact::from(output).convert_to(self.output_kind)
    }
}

/// A progress sink that records every notification.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Vec<String>,
}

impl RecordingProgress {
    /// The notifications received so far.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.clone()
    }
}

impl Progress for RecordingProgress {
    fn start_stage(&mut self, text: &str) {
        self.events.push(format!("start_stage:{text}"));
    }

    fn end_stage(&mut self) {
        self.events.push("end_stage".to_string());
    }

    fn start_step(&mut self, text: &str) {
        self.events.push(format!("start_step:{text}"));
    }

    fn end_step(&mut self) {
        self.events.push("end_step".to_string());
    }

    fn succeed(&mut self) {
        self.events.push("succeed".to_string());
    }

    fn fail(&mut self, text: Option<&str>) {
        match text {
            Some(text) => self.events.push(format!("fail:{text}")),
            None => self.events.push("fail".to_string()),
        }
    }

    fn stop(&mut self) {
        self.events.push("stop".to_string());
    }
}
