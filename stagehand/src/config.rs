//! TOML configuration.
//!
//! A configuration names the stages known by file extension and declares
//! command stages:
//!
//! ```toml
//! [stages.c]
//! file_extensions = [".c"]
//!
//! [[commands]]
//! name = "gcc"
//! src = "c"
//! target = "object"
//! vars = { cc = "gcc" }
//!
//! [[commands.steps]]
//! name = "compile"
//! cmd = "{cc} -c {input} -o /dev/stdout"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::RepresentationKind;
use crate::errors::{Result, StagehandError};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "STAGEHAND_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagehandConfig {
    /// Stage names and the file extensions that imply them.
    pub stages: IndexMap<String, StageNodeConfig>,
    /// Command stages, in registration order.
    pub commands: Vec<CommandStageConfig>,
}

/// Settings for a stage name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageNodeConfig {
    /// Extensions, with the leading `.`.
    pub file_extensions: Vec<String>,
}

/// What a command stage produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutput {
    /// The last step's stdout.
    #[default]
    Stream,
    /// A fresh directory passed to steps as `{out_dir}`.
    Directory,
}

impl CommandOutput {
    /// The artifact kind this output maps to.
    #[must_use]
    pub fn kind(self) -> RepresentationKind {
        match self {
            Self::Stream => RepresentationKind::Stream,
            Self::Directory => RepresentationKind::Directory,
        }
    }
}

/// A stage made of shell command templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandStageConfig {
    /// Stage name; defaults to `src`.
    #[serde(default)]
    pub name: Option<String>,
    /// Source stage name.
    pub src: String,
    /// Target stage name.
    pub target: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Representation the first step receives.
    #[serde(default = "default_input")]
    pub input: RepresentationKind,
    /// What the stage produces.
    #[serde(default)]
    pub output: CommandOutput,
    /// Hide the driver's progress indicator while this stage runs.
    #[serde(default)]
    pub no_progress: bool,
    /// Template variables.
    #[serde(default)]
    pub vars: IndexMap<String, String>,
    /// Steps, run in order.
    pub steps: Vec<CommandStepConfig>,
}

fn default_input() -> RepresentationKind {
    RepresentationKind::Path
}

/// One shell command inside a command stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandStepConfig {
    /// Step name, used for profiling.
    pub name: String,
    /// Command template.
    pub cmd: String,
    /// Human description; defaults to the command text.
    #[serde(default)]
    pub description: Option<String>,
}

impl CommandStageConfig {
    /// The stage name, falling back to the source stage.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.src)
    }

    fn validate(&self) -> Result<()> {
        let name = self.stage_name();
        if self.steps.is_empty() {
            return Err(StagehandError::config(format!("command `{name}' has no steps")));
        }
        if self.input == RepresentationKind::Directory {
            return Err(StagehandError::config(format!(
                "command `{name}' cannot take a directory as input"
            )));
        }
        Ok(())
    }
}

impl StagehandConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or a
    /// command is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        for command in &config.commands {
            command.validate()?;
        }
        Ok(config)
    }

    /// Loads the configuration.
    ///
    /// `explicit` wins, then [`CONFIG_ENV`], then
    /// `<config_dir>/stagehand/config.toml`. Only the default location may
    /// be missing, in which case the configuration is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::FileNotFound`] for a missing explicit file
    /// and parse errors for invalid content.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        if let Some(path) = named {
            if !path.is_file() {
                return Err(StagehandError::FileNotFound(path));
            }
            return Self::read(&path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => {
                debug!("No configuration file found; using empty configuration");
                Ok(Self::default())
            }
        }
    }

    /// The default configuration location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stagehand").join("config.toml"))
    }

    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Applies a `<command>.<key>=<value>` override to a command's variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the override is malformed or names
    /// an unknown command.
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let malformed = || {
            StagehandError::config(format!(
                "invalid override `{assignment}'; expected <command>.<key>=<value>"
            ))
        };

        let (lhs, value) = assignment.split_once('=').ok_or_else(malformed)?;
        let (command, key) = lhs.split_once('.').ok_or_else(malformed)?;
        if command.is_empty() || key.is_empty() {
            return Err(malformed());
        }

        let target = self
            .commands
            .iter_mut()
            .find(|c| c.stage_name() == command)
            .ok_or_else(|| StagehandError::config(format!("no command named `{command}'")))?;
        target.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Finds the stage whose extensions include `extension` (with the `.`).
    ///
    /// Stages are searched in declaration order.
    #[must_use]
    pub fn stage_for_extension(&self, extension: &str) -> Option<&str> {
        self.stages
            .iter()
            .find(|(_, node)| node.file_extensions.iter().any(|e| e == extension))
            .map(|(name, _)| name.as_str())
    }
}
