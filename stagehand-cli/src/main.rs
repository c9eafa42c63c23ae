//! Command-line front end for stagehand.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use stagehand::config::StagehandConfig;
use stagehand::observability::{init_logging, NoProgress, StatusLine};
use stagehand::pipeline::{run, Registry};
use stagehand::stages::Stage;
use stagehand::utils::ShellRunner;
use tracing::debug;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let mut config = StagehandConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    for assignment in &cli.set {
        config.apply_override(assignment)?;
    }

    let verbosity = cli.verbosity();
    let registry = Registry::from_config(&config, ShellRunner::new(verbosity))?;
    debug!(stages = registry.len(), "Registry built");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list {
        list_stages(&registry, &mut out)?;
        return Ok(());
    }

    let options = cli.run_options();
    if options.progress_enabled() {
        let mut progress = StatusLine::stderr(options.persist_progress());
        run(options, &config, registry, &mut progress, &mut out)?;
    } else {
        run(options, &config, registry, &mut NoProgress, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn list_stages(registry: &Registry, out: &mut dyn Write) -> io::Result<()> {
    for stage in registry.stages() {
        writeln!(
            out,
            "{}: {} → {}  {}",
            stage.name(),
            stage.src_stage(),
            stage.target_stage(),
            stage.description()
        )?;
    }
    Ok(())
}
