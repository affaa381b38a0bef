//! XML report

use super::{ReportError, Reporter};
use crate::warning::Warning;
use quick_xml::escape::escape;
use std::io::Write;

/// Report format version written to the root element
const FORMAT_VERSION: &str = "1";

/// Writes one `<issue>` element per warning
pub struct XmlReporter {
    out: Box<dyn Write>,
}

impl XmlReporter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    fn format_warning(warning: &Warning) -> String {
        let issue = &warning.issue;
        let mut attributes = vec![
            ("id", issue.id().to_string()),
            ("severity", warning.severity.description().to_string()),
            ("message", warning.message.clone()),
            ("category", issue.category().full_name().to_string()),
            ("priority", issue.priority().to_string()),
            ("summary", issue.summary().to_string()),
        ];
        if let Some(path) = &warning.path {
            attributes.push(("file", path.clone()));
        }
        if let Some(line) = warning.line {
            attributes.push(("line", (line + 1).to_string()));
        }
        if let Some(column) = warning.column {
            attributes.push(("column", (column + 1).to_string()));
        }

        let mut element = String::from("    <issue");
        for (name, value) in attributes {
            element.push_str(&format!("\n        {}=\"{}\"", name, escape(value.as_str())));
        }
        element.push_str(" />\n");
        element
    }
}

impl Reporter for XmlReporter {
    fn write(
        &mut self,
        _error_count: usize,
        _warning_count: usize,
        warnings: &[Warning],
    ) -> Result<(), ReportError> {
        let mut output = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        output.push_str(&format!("<issues format=\"{}\">\n", FORMAT_VERSION));
        for warning in warnings {
            output.push_str(&Self::format_warning(warning));
        }
        output.push_str("</issues>\n");

        let written = self.out.write_all(output.as_bytes());
        let flushed = self.out.flush();
        written?;
        flushed?;
        Ok(())
    }
}
