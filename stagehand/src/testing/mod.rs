//! Testing utilities for stagehand pipelines.
//!
//! This module provides:
//! - Mock stages and a recording progress sink
//! - Registry and filesystem fixtures
//! - Assertions for artifacts and errors

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_artifact_kind, assert_artifact_text, assert_resolution_error, assert_step_failure,
};
pub use fixtures::{chain_registry, chain_registry_with_log, TestWorkspace};
pub use mocks::{CallLog, MockStage, RecordingProgress, MOCK_OUTPUT_FILE};
