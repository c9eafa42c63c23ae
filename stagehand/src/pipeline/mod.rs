//! Route resolution and pipeline execution.
//!
//! This module provides:
//! - The stage registry and route search
//! - Run options
//! - Path construction from files and stage names
//! - The driver that runs, profiles and emits

mod driver;
mod options;
mod path;
mod registry;

#[cfg(test)]
mod integration_tests;

pub use driver::{run, Execution, Pipeline, RunOutcome, DRY_RUN_HEADER};
pub use options::RunOptions;
pub use path::{construct_path, discover_implied_stage};
pub use registry::{Registry, StageId};
