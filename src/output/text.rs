//! Plain text report

use super::{plural, ReportError, Reporter};
use crate::issue::Severity;
use crate::warning::{PathDisplay, Warning};
use colored::*;
use std::io::{self, IsTerminal, Write};

/// Text reporter with optional color support
pub struct TextReporter {
    out: Box<dyn Write>,

    /// Enable colored output
    colored: bool,

    /// Display of secondary location paths
    paths: PathDisplay,
}

impl TextReporter {
    /// Reporter writing to `out`, without color
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            out,
            colored: false,
            paths: PathDisplay::full(),
        }
    }

    /// Reporter writing to stdout, colored when stdout is a terminal
    pub fn stdout() -> Self {
        let colored = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout())).with_color(colored)
    }

    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn with_paths(mut self, paths: PathDisplay) -> Self {
        self.paths = paths;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = severity.description();
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Informational | Severity::Ignore => s.blue(),
        }
    }

    fn format_warning(&self, warning: &Warning) -> String {
        let mut output = String::new();

        if let Some(path) = &warning.path {
            let location = match warning.line {
                Some(line) => format!("{}:{}:", path, line + 1),
                None => format!("{}:", path),
            };
            if self.colored {
                output.push_str(&location.bold().to_string());
            } else {
                output.push_str(&location);
            }
            output.push(' ');
        }

        let id = format!("[{}]", warning.issue.id());
        output.push_str(&format!(
            "{}: {} {}\n",
            self.severity_str(warning.severity),
            warning.message,
            if self.colored { id.dimmed().to_string() } else { id }
        ));

        if let Some(snippet) = &warning.error_line {
            output.push_str(snippet);
        }

        if let Some(location) = &warning.location {
            for secondary in location.secondaries() {
                output.push_str("    ");
                output.push_str(&self.paths.display(&secondary.file));
                output.push(':');
                if let Some(line) = secondary.line() {
                    output.push_str(&format!("{}:", line + 1));
                }
                if let Some(message) = &secondary.message {
                    output.push(' ');
                    output.push_str(message);
                }
                output.push('\n');
            }
        }
        output
    }
}

/// Summary line for a report
pub(crate) fn summary(error_count: usize, warning_count: usize) -> String {
    if error_count == 0 && warning_count == 0 {
        "No issues found.".to_string()
    } else {
        format!(
            "{}, {}",
            plural(error_count, "error"),
            plural(warning_count, "warning")
        )
    }
}

impl Reporter for TextReporter {
    fn write(
        &mut self,
        error_count: usize,
        warning_count: usize,
        warnings: &[Warning],
    ) -> Result<(), ReportError> {
        let mut output = String::new();
        for warning in warnings {
            output.push_str(&self.format_warning(warning));
        }
        output.push_str(&summary(error_count, warning_count));
        output.push('\n');

        let written = self.out.write_all(output.as_bytes());
        let flushed = self.out.flush();
        written?;
        flushed?;
        Ok(())
    }
}
