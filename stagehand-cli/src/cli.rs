use std::path::PathBuf;

use clap::{ArgAction, Parser};
use stagehand::observability::Verbosity;
use stagehand::pipeline::RunOptions;

#[derive(Debug, Parser, Clone)]
#[command(name = "stagehand")]
#[command(version)]
#[command(about = "Run a chain of toolchain stages from one file format to another")]
pub struct Cli {
    /// Input file; its extension implies the source stage.
    pub input: Option<PathBuf>,

    /// Output file; its extension implies the target stage.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Source stage, overriding the input file's extension.
    #[arg(long = "from", value_name = "STAGE")]
    pub from: Option<String>,

    /// Target stage, overriding the output file's extension.
    #[arg(long = "to", value_name = "STAGE")]
    pub to: Option<String>,

    /// Stage the route must pass through. May be repeated.
    #[arg(long, value_name = "STAGE")]
    pub through: Vec<String>,

    /// Print the stages that would run without running them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only print errors and the result.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Replace the output with timing. Without values, time every stage;
    /// otherwise time `stage` or `stage.step` entries.
    #[arg(short = 'p', long = "profile", value_name = "STAGE[.STEP]", num_args = 0..)]
    pub profile: Option<Vec<String>>,

    /// Print profiling reports as CSV.
    #[arg(long)]
    pub csv: bool,

    /// Configuration file (defaults to $STAGEHAND_CONFIG, then the user config directory).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override a command variable: <command>.<key>=<value>. May be repeated.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// List registered stages and exit.
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// The verbosity implied by `-q` and `-v`.
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::from_occurrences(self.verbose)
        }
    }

    /// Converts the arguments into run options.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            through: self.through.clone(),
            dry_run: self.dry_run,
            quiet: self.quiet,
            verbosity: self.verbosity(),
            profile: self.profile.clone(),
            csv: self.csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stagehand").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["main.c"]);
        assert_eq!(cli.input, Some(PathBuf::from("main.c")));
        assert_eq!(cli.profile, None);
        assert_eq!(cli.verbosity(), Verbosity::Warn);
        assert!(cli.run_options().progress_enabled());
    }

    #[test]
    fn test_route_flags() {
        let cli = parse(&[
            "main.c", "-o", "main.o", "--from", "c", "--to", "object", "--through", "asm",
            "--through", "ir",
        ]);
        let options = cli.run_options();
        assert_eq!(options.output, Some(PathBuf::from("main.o")));
        assert_eq!(options.from.as_deref(), Some("c"));
        assert_eq!(options.to.as_deref(), Some("object"));
        assert_eq!(options.through, vec!["asm", "ir"]);
    }

    #[test]
    fn test_bare_profile_flag_profiles_everything() {
        let cli = parse(&["main.c", "-p"]);
        assert_eq!(cli.profile, Some(Vec::new()));
    }

    #[test]
    fn test_profile_tokens() {
        let cli = parse(&["main.c", "--csv", "-p", "compile.parse", "link"]);
        assert_eq!(
            cli.profile,
            Some(vec!["compile.parse".to_string(), "link".to_string()])
        );
        assert!(cli.csv);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["-v"]).verbosity(), Verbosity::Info);
        assert_eq!(parse(&["-vv"]).verbosity(), Verbosity::Debug);
        assert_eq!(parse(&["-q"]).verbosity(), Verbosity::Quiet);
        assert!(!parse(&["-vv"]).run_options().progress_enabled());
        assert!(!parse(&["-n"]).run_options().progress_enabled());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["stagehand", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_and_config() {
        let cli = parse(&["--config", "s.toml", "--set", "gcc.cc=clang", "--set", "gcc.o=2", "--list"]);
        assert_eq!(cli.config, Some(PathBuf::from("s.toml")));
        assert_eq!(cli.set, vec!["gcc.cc=clang", "gcc.o=2"]);
        assert!(cli.list);
    }
}
