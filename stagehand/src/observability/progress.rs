//! Progress indicator shown while a pipeline runs.

use std::io::{self, IsTerminal, Stderr, Write};

const RUNNING_MARK: &str = "…";
const SUCCESS_MARK: &str = "✔";
const FAILURE_MARK: &str = "✖";

/// Receives progress notifications from the driver and from stages.
///
/// The driver reports stage boundaries. Stages that suppress the indicator
/// receive it directly and may report their own steps.
pub trait Progress {
    /// A stage started; `text` describes it.
    fn start_stage(&mut self, text: &str);

    /// The current stage finished successfully.
    fn end_stage(&mut self);

    /// A step inside the current stage started.
    fn start_step(&mut self, text: &str);

    /// The current step finished successfully.
    fn end_step(&mut self);

    /// Marks the current text as succeeded.
    fn succeed(&mut self);

    /// Marks the current text (or `text`) as failed.
    fn fail(&mut self, text: Option<&str>);

    /// Hides the indicator until the next start.
    fn stop(&mut self);
}

/// A progress sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start_stage(&mut self, _text: &str) {}
    fn end_stage(&mut self) {}
    fn start_step(&mut self, _text: &str) {}
    fn end_step(&mut self) {}
    fn succeed(&mut self) {}
    fn fail(&mut self, _text: Option<&str>) {}
    fn stop(&mut self) {}
}

/// A single-line status indicator.
///
/// On an interactive writer the current `"<stage>: <step>"` text is redrawn
/// in place. Completed stages and steps are written as permanent lines only
/// when `persist` is set; failures are always written.
#[derive(Debug)]
pub struct StatusLine<W: Write> {
    out: W,
    interactive: bool,
    persist: bool,
    stage_text: String,
    step_text: String,
    drawn: bool,
}

impl StatusLine<Stderr> {
    /// Creates an indicator on stderr.
    #[must_use]
    pub fn stderr(persist: bool) -> Self {
        let interactive = io::stderr().is_terminal();
        Self::new(io::stderr(), interactive, persist)
    }
}

impl<W: Write> StatusLine<W> {
    /// Creates an indicator writing to `out`.
    pub fn new(out: W, interactive: bool, persist: bool) -> Self {
        Self {
            out,
            interactive,
            persist,
            stage_text: String::new(),
            step_text: String::new(),
            drawn: false,
        }
    }

    /// Consumes the indicator and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn text(&self) -> String {
        if self.step_text.is_empty() {
            self.stage_text.clone()
        } else {
            format!("{}: {}", self.stage_text, self.step_text)
        }
    }

    fn draw(&mut self) {
        if self.interactive {
            let text = self.text();
            let _ = write!(self.out, "\r\x1b[2K{RUNNING_MARK} {text}");
            let _ = self.out.flush();
            self.drawn = true;
        }
    }

    fn clear(&mut self) {
        if self.drawn {
            let _ = write!(self.out, "\r\x1b[2K");
            let _ = self.out.flush();
            self.drawn = false;
        }
    }

    fn persist_line(&mut self, mark: &str, text: &str) {
        self.clear();
        let _ = writeln!(self.out, "{mark} {text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Progress for StatusLine<W> {
    fn start_stage(&mut self, text: &str) {
        self.stage_text = text.to_string();
        self.step_text.clear();
        self.draw();
    }

    fn end_stage(&mut self) {
        if self.persist {
            self.succeed();
        } else {
            self.clear();
        }
    }

    fn start_step(&mut self, text: &str) {
        self.step_text = text.to_string();
        self.draw();
    }

    fn end_step(&mut self) {
        if self.persist {
            self.succeed();
        }
        self.step_text.clear();
        self.draw();
    }

    fn succeed(&mut self) {
        let text = self.text();
        self.persist_line(SUCCESS_MARK, &text);
    }

    fn fail(&mut self, text: Option<&str>) {
        let text = text.map_or_else(|| self.text(), str::to_string);
        self.persist_line(FAILURE_MARK, &text);
    }

    fn stop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn output(line: StatusLine<Vec<u8>>) -> String {
        String::from_utf8(line.into_inner()).unwrap()
    }

    #[test]
    fn test_non_persistent_line_is_silent_on_success() {
        let mut line = StatusLine::new(Vec::new(), false, false);
        line.start_stage("c → o");
        line.start_step("compile");
        line.end_step();
        line.end_stage();
        line.stop();

        assert_eq!(output(line), "");
    }

    #[test]
    fn test_persistent_line_records_steps_and_stages() {
        let mut line = StatusLine::new(Vec::new(), false, true);
        line.start_stage("c → o");
        line.start_step("compile");
        line.end_step();
        line.end_stage();

        assert_eq!(output(line), "✔ c → o: compile\n✔ c → o\n");
    }

    #[test]
    fn test_failure_is_always_written() {
        let mut line = StatusLine::new(Vec::new(), false, false);
        line.start_stage("c → o");
        line.fail(None);

        assert_eq!(output(line), "✖ c → o\n");
    }

    #[test]
    fn test_interactive_line_redraws_and_clears() {
        let mut line = StatusLine::new(Vec::new(), true, false);
        line.start_stage("c → o");
        line.stop();

        assert_eq!(output(line), "\r\x1b[2K… c → o\r\x1b[2K");
    }

    #[test]
    fn test_explicit_failure_text() {
        let mut line = StatusLine::new(Vec::new(), false, false);
        line.start_stage("c → o");
        line.fail(Some("linker crashed"));

        assert_eq!(output(line), "✖ linker crashed\n");
    }
}
