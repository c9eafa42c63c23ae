//! Synchronous shell invocation with output capture.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::errors::{Result, StepFailure};
use crate::observability::Verbosity;

/// Runs external commands through `sh -c`.
///
/// The runner inherits the caller's environment. Whether stderr is captured
/// depends on the verbosity it was created with: at debug verbosity stderr
/// passes through to the terminal instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner {
    verbosity: Verbosity,
}

impl ShellRunner {
    /// Creates a runner for the given verbosity.
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Returns the verbosity this runner was created with.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Runs `command` and returns its stdout, positioned at the start.
    ///
    /// # Errors
    ///
    /// Returns a [`StepFailure`] if the command exits non-zero.
    pub fn shell(&self, command: &str) -> Result<File> {
        self.shell_with(command, None, false)
    }

    /// Runs `command` with an optional stdin.
    ///
    /// With `stdout_as_debug` the command's stdout is redirected to its
    /// stderr, so the returned stream is empty.
    pub fn shell_with(
        &self,
        command: &str,
        stdin: Option<File>,
        stdout_as_debug: bool,
    ) -> Result<File> {
        let command = if stdout_as_debug {
            format!("{command} >&2")
        } else {
            command.to_string()
        };
        debug!(command = %command, "Running shell command");

        let mut stdout = tempfile::tempfile()?;
        let mut stderr = if self.verbosity.is_debug() {
            None
        } else {
            Some(tempfile::tempfile()?)
        };

        let mut process = Command::new("sh");
        process
            .arg("-c")
            .arg(&command)
            .stdout(Stdio::from(stdout.try_clone()?));
        if let Some(input) = stdin {
            process.stdin(Stdio::from(input));
        }
        if let Some(ref capture) = stderr {
            process.stderr(Stdio::from(capture.try_clone()?));
        }

        let status = process.status()?;
        stdout.seek(SeekFrom::Start(0))?;

        if status.success() {
            return Ok(stdout);
        }

        debug!(command = %command, code = ?status.code(), "Shell command failed");
        match stderr.as_mut() {
            Some(capture) => {
                capture.seek(SeekFrom::Start(0))?;
                Err(StepFailure::new(command, read_lossy(&mut stdout)?, read_lossy(capture)?).into())
            }
            None => Err(StepFailure::uncaptured(command).into()),
        }
    }

    /// Runs `command` without capturing anything.
    ///
    /// The exit status is ignored. Only a failure to start the shell is
    /// reported.
    pub fn transparent_shell(&self, command: &str) -> Result<()> {
        debug!(command = %command, "Running transparent shell command");
        let status = Command::new("sh").arg("-c").arg(command).status()?;
        if !status.success() {
            debug!(command = %command, code = ?status.code(), "Transparent command exited non-zero");
        }
        Ok(())
    }
}

fn read_lossy(file: &mut File) -> Result<String> {
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Quote a single argument for shell execution.
///
/// Arguments without shell metacharacters are returned unchanged. Everything
/// else is wrapped in single quotes with embedded quotes escaped.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', "'\\''"))
}
