//! Test assertions for pipeline results.

use crate::core::{Artifact, RepresentationKind};
use crate::errors::StagehandError;

/// Asserts that the artifact has the expected kind.
pub fn assert_artifact_kind(artifact: &Artifact, expected: RepresentationKind) {
    assert_eq!(
        artifact.kind(),
        expected,
        "Expected a {expected} artifact, got {}",
        artifact.kind()
    );
}

/// Asserts that the artifact's text equals `expected`.
pub fn assert_artifact_text(artifact: Artifact, expected: &str) {
    match artifact.into_string() {
        Ok(text) => assert_eq!(text, expected, "Unexpected artifact text"),
        Err(err) => panic!("Expected text artifact, conversion failed: {err}"),
    }
}

/// Asserts that the error is a step failure for `command`.
pub fn assert_step_failure(err: &StagehandError, command: &str) {
    match err {
        StagehandError::StepFailure(failure) => assert_eq!(
            failure.command, command,
            "Step failure for unexpected command"
        ),
        other => panic!("Expected step failure for `{command}', got: {other}"),
    }
}

/// Asserts that the error was raised before any stage ran.
pub fn assert_resolution_error(err: &StagehandError) {
    assert!(
        err.is_resolution_error(),
        "Expected a resolution error, got: {err}"
    );
}
