//! Profiling requests and timing reports.
//!
//! A request names stages, optionally narrowed to steps, using `stage` and
//! `stage.step` tokens. After a pipeline runs, each requested stage's step
//! durations are gathered and rendered in one of two text forms:
//!
//! ```text
//! compile                          elapsed time (s)
//! parse                            0.123
//! codegen                          2.0
//! ```
//!
//! or, as CSV without a header:
//!
//! ```text
//! compile,parse,0.123
//! compile,codegen,2.0
//! ```

use indexmap::{IndexMap, IndexSet};
use std::fmt::Write as _;

use crate::errors::{Result, StagehandError};
use crate::stages::Stage;

/// Minimum width of the name column in the human form.
const NAME_COLUMN: usize = 33;

/// Header text of the duration column.
const DURATION_HEADER: &str = "elapsed time (s)";

/// Label used for the whole-pipeline table.
pub const OVERALL_LABEL: &str = "stage";

/// Text form of a profiling report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Aligned columns with a header line.
    #[default]
    Human,
    /// `label,item,seconds` lines.
    Csv,
}

/// Stages and steps requested for profiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilingRequest {
    stages: IndexMap<String, IndexSet<String>>,
}

impl ProfilingRequest {
    /// Parses `stage` and `stage.step` tokens.
    ///
    /// Every named stage becomes a key in order of first appearance. All
    /// step names are collected under the stage of the last `stage.step`
    /// token, so `a.a1 b.b1` yields `{a: [], b: [a1, b1]}`.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut stages: IndexMap<String, IndexSet<String>> = IndexMap::new();
        let mut steps: Vec<&str> = Vec::new();
        let mut step_owner: Option<&str> = None;

        for token in tokens {
            let token = token.as_ref();
            match token.split_once('.') {
                Some((stage, step)) => {
                    stages.entry(stage.to_string()).or_default();
                    steps.push(step);
                    step_owner = Some(stage);
                }
                None => {
                    stages.entry(token.to_string()).or_default();
                }
            }
        }

        if let Some(owner) = step_owner {
            if let Some(set) = stages.get_mut(owner) {
                set.extend(steps.into_iter().map(str::to_string));
            }
        }
        Self { stages }
    }

    /// Returns true if no stage was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns true if `stage` was requested.
    #[must_use]
    pub fn contains_stage(&self, stage: &str) -> bool {
        self.stages.contains_key(stage)
    }

    /// The steps requested for `stage`; empty means all of them.
    #[must_use]
    pub fn steps(&self, stage: &str) -> Option<&IndexSet<String>> {
        self.stages.get(stage)
    }

    /// Iterates requested stages in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.stages.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Gathers and renders every requested stage, joined by newlines.
    ///
    /// # Errors
    ///
    /// Fails on the first stage that was not executed or that does not
    /// declare a requested step.
    pub fn report(&self, executed: &[&dyn Stage], format: ReportFormat) -> Result<String> {
        let mut reports = Vec::with_capacity(self.stages.len());
        for (stage, steps) in self.iter() {
            reports.push(StageProfile::gather(stage, steps, executed)?.render(format));
        }
        Ok(reports.join("\n"))
    }
}

/// Rounds to 3 decimal places and formats with at least one decimal digit.
///
/// Rounding works on the exact binary value with ties to even, so `1.0005`
/// (stored just below the tie) gives `1.0` and `0.0625` gives `0.062`.
#[must_use]
pub fn format_seconds(secs: f64) -> String {
    let rounded: f64 = format!("{secs:.3}").parse().unwrap_or(secs);
    format!("{rounded:?}")
}

fn padded(name: &str) -> String {
    let width = name.chars().count();
    let pad = NAME_COLUMN.saturating_sub(width).max(1);
    format!("{name}{}", " ".repeat(pad))
}

/// Renders a report.
///
/// # Panics
///
/// Panics if `items` and `durations` differ in length.
pub fn render<S: AsRef<str>>(
    label: &str,
    items: &[S],
    durations: &[f64],
    format: ReportFormat,
) -> String {
    assert_eq!(
        items.len(),
        durations.len(),
        "profiling items and durations must be parallel"
    );

    let rows = items.iter().zip(durations);
    match format {
        ReportFormat::Human => {
            let mut out = format!("{}{DURATION_HEADER}\n", padded(label));
            let lines: Vec<String> = rows
                .map(|(item, secs)| format!("{}{}", padded(item.as_ref()), format_seconds(*secs)))
                .collect();
            out.push_str(&lines.join("\n"));
            out
        }
        ReportFormat::Csv => {
            let mut out = String::new();
            for (i, (item, secs)) in rows.enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = write!(out, "{label},{},{}", item.as_ref(), format_seconds(*secs));
            }
            out
        }
    }
}

/// Renders the per-stage table for a completed pipeline.
pub fn overall_report(stages: &[&dyn Stage], durations: &[f64], format: ReportFormat) -> String {
    let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
    render(OVERALL_LABEL, &names, durations, format)
}

/// Measured durations of selected steps of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageProfile {
    /// The stage name.
    pub stage: String,
    /// Step names, in the stage's declared order.
    pub steps: Vec<String>,
    /// Seconds per step.
    pub durations: Vec<f64>,
}

impl StageProfile {
    /// Collects durations for `steps` of the executed stage named `stage`.
    ///
    /// An empty `steps` selects every declared step.
    ///
    /// # Errors
    ///
    /// - [`StagehandError::UndefinedStage`] if `stage` was not executed
    /// - [`StagehandError::UndefinedSteps`] naming every unknown step
    /// - [`StagehandError::UnmeasuredStep`] if a selected step has no duration
    pub fn gather(stage: &str, steps: &IndexSet<String>, executed: &[&dyn Stage]) -> Result<Self> {
        let found = executed
            .iter()
            .find(|s| s.name() == stage)
            .ok_or_else(|| StagehandError::undefined_stage(stage))?;

        let declared = found.step_names();
        let invalid: Vec<String> = steps
            .iter()
            .filter(|s| !declared.contains(s))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(StagehandError::undefined_steps(stage, invalid));
        }

        let selected: Vec<String> = declared
            .into_iter()
            .filter(|s| steps.is_empty() || steps.contains(s))
            .collect();

        let recorded = found.durations();
        let durations = selected
            .iter()
            .map(|step| {
                recorded
                    .get(step)
                    .copied()
                    .ok_or_else(|| StagehandError::UnmeasuredStep {
                        stage: stage.to_string(),
                        step: step.clone(),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self {
            stage: stage.to_string(),
            steps: selected,
            durations,
        })
    }

    /// Renders this profile.
    #[must_use]
    pub fn render(&self, format: ReportFormat) -> String {
        render(&self.stage, &self.steps, &self.durations, format)
    }
}
