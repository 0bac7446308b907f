//! Result logger: the learner-facing record of a verification run.
//!
//! This is product output, separate from `tracing` diagnostics. Lines are
//! kept in order and, unless the logger is quiet, echoed to stdout as they
//! arrive.

/// Capability to append result lines. Checks borrow one for each run.
pub trait LineSink: Send {
    /// Append one line.
    fn log(&mut self, line: String);

    /// Report an evaluation error trace. Supplements, never replaces, the
    /// check's own failure line.
    fn trace(&mut self, error: &anyhow::Error);
}

/// Append-only line buffer owned by a [`Problem`](crate::problem::Problem).
#[derive(Debug, Clone)]
pub struct Logger {
    lines: Vec<String>,
    echo: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// A logger that mirrors every line to stdout and traces to stderr.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            echo: true,
        }
    }

    /// A logger that only records.
    pub fn quiet() -> Self {
        Self {
            lines: Vec::new(),
            echo: false,
        }
    }

    pub fn is_echoing(&self) -> bool {
        self.echo
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drop recorded lines, keeping the echo setting.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whole log as one string, one line per entry.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl LineSink for Logger {
    fn log(&mut self, line: String) {
        if self.echo {
            println!("{line}");
        }
        self.lines.push(line);
    }

    fn trace(&mut self, error: &anyhow::Error) {
        tracing::debug!("check raised: {error:#}");
        if self.echo {
            eprintln!("{error:?}");
        }
    }
}
