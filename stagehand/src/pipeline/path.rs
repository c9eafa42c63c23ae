//! Resolving the stage route for a run.

use std::path::Path;
use tracing::debug;

use super::{Registry, RunOptions, StageId};
use crate::config::StagehandConfig;
use crate::errors::{Result, StagehandError};

/// Finds the stage implied by `file`'s extension.
///
/// Extensions are compared with their leading `.`, against the configured
/// stages in declaration order.
///
/// # Errors
///
/// [`StagehandError::NoInputFile`] without a file (with no hints), and
/// [`StagehandError::UnknownExtension`] when no stage claims the extension.
pub fn discover_implied_stage(file: Option<&Path>, config: &StagehandConfig) -> Result<String> {
    let file = file.ok_or(StagehandError::NoInputFile {
        possible_dests: Vec::new(),
    })?;

    let suffix = file
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    config
        .stage_for_extension(&suffix)
        .map(str::to_string)
        .ok_or_else(|| StagehandError::UnknownExtension {
            filename: file.to_path_buf(),
        })
}

/// Resolves the source and target stages and the route between them.
///
/// # Errors
///
/// Any resolution error: missing input or output, unknown extension,
/// unknown stage name, no route, or a route that runs nothing.
pub fn construct_path(
    options: &RunOptions,
    config: &StagehandConfig,
    registry: &Registry,
) -> Result<Vec<StageId>> {
    let source = match &options.from {
        Some(stage) => known(stage, registry)?,
        None => match options.input_path() {
            Some(file) => discover_implied_stage(Some(file), config)?,
            None => {
                return Err(StagehandError::NoInputFile {
                    possible_dests: registry
                        .stage_names()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                })
            }
        },
    };

    let target = match &options.to {
        Some(stage) => known(stage, registry)?,
        None => match options.output_path() {
            Some(file) => discover_implied_stage(Some(file), config)?,
            None => return Err(StagehandError::NoOutputFile),
        },
    };

    debug!(source = %source, target = %target, through = ?options.through, "Resolving route");

    let path = registry
        .make_path(&source, &target, &options.through)
        .ok_or_else(|| StagehandError::no_path_found(&source, &target, &options.through))?;

    if path.is_empty() {
        return Err(StagehandError::TrivialPath { stage: source });
    }
    Ok(path)
}

fn known(stage: &str, registry: &Registry) -> Result<String> {
    if registry.knows_stage(stage) {
        Ok(stage.to_string())
    } else {
        Err(StagehandError::UnknownStage(stage.to_string()))
    }
}
