//! Wall-clock timing for named units of work.

use std::time::Instant;

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span, logs it, and returns the duration in seconds.
    pub fn finish(self) -> f64 {
        let secs = self.elapsed_secs();
        tracing::debug!(span_name = %self.name, duration_ms = secs * 1000.0, "Span ended");
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("compile");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "compile");
        let duration = timer.finish();
        assert!(duration >= 0.01);
    }
}
