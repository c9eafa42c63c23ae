//! Test fixtures for pipeline testing.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use super::{CallLog, MockStage};
use crate::pipeline::Registry;

/// Builds a registry of string mocks chaining `names` in order.
///
/// Stage `i` is named `names[i]` and runs from `names[i]` to `names[i + 1]`.
///
/// # Panics
///
/// Panics if `names` repeats a name.
#[must_use]
pub fn chain_registry(names: &[&str]) -> Registry {
    chain_registry_with_log(names, &CallLog::default())
}

/// Like [`chain_registry`], with every mock writing to `log`.
///
/// # Panics
///
/// Panics if `names` repeats a name.
#[must_use]
pub fn chain_registry_with_log(names: &[&str], log: &CallLog) -> Registry {
    let mut registry = Registry::new();
    for pair in names.windows(2) {
        let stage = MockStage::new(pair[0], pair[0], pair[1]).with_log(log);
        if let Err(err) = registry.register(Box::new(stage)) {
            panic!("invalid chain fixture: {err}");
        }
    }
    registry
}

/// A scratch directory holding input and output files for a test.
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Creates an empty workspace.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        match tempfile::tempdir() {
            Ok(dir) => Self { dir },
            Err(err) => panic!("cannot create test workspace: {err}"),
        }
    }

    /// Returns the path of `name` inside the workspace.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes `contents` to `name` and returns its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Err(err) = fs::write(&path, contents) {
            panic!("cannot write {}: {err}", path.display());
        }
        path
    }

    /// Reads `name` back as text.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, name: &str) -> String {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => panic!("cannot read {}: {err}", path.display()),
        }
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
