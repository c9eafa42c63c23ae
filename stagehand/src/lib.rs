//! # Stagehand
//!
//! A pipeline executor for toolchain orchestration.
//!
//! Given an input file and a desired output, stagehand resolves an ordered
//! route of stages, each wrapping an external tool, and streams a single
//! artifact through them:
//!
//! - **Lazily converted artifacts**: a value may be a path, an open stream,
//!   bytes, text or a directory, and is converted only when a stage needs it
//! - **Configured command stages**: shell command templates loaded from TOML
//! - **Dry runs**: print the route without running anything
//! - **Profiling**: per-stage and per-step timing reports, human or CSV
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagehand::prelude::*;
//!
//! let config = StagehandConfig::load(None)?;
//! let registry = Registry::from_config(&config, ShellRunner::default())?;
//! let options = RunOptions::new()
//!     .with_input("main.c")
//!     .with_output("main.o");
//!
//! run(options, &config, registry, &mut NoProgress, &mut std::io::stdout())?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{CommandOutput, CommandStageConfig, StagehandConfig};
    pub use crate::core::{Artifact, ConversionGraph, Directory, RepresentationKind};
    pub use crate::errors::{Result, StagehandError, StepFailure};
    pub use crate::observability::{
        init_logging, NoProgress, Progress, ProfilingRequest, ReportFormat, StatusLine, Verbosity,
    };
    pub use crate::pipeline::{run, Pipeline, Registry, RunOptions, RunOutcome};
    pub use crate::stages::{CommandStage, Stage, StepStage};
    pub use crate::utils::ShellRunner;
}
