//! Reporters for lint results

mod html;
mod multi;
mod text;
mod xml;

pub use html::{HtmlReporter, SPLIT_LIMIT};
pub use multi::MultiProjectHtmlReporter;
pub use text::TextReporter;
pub use xml::XmlReporter;

use crate::warning::Warning;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reporter error
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Could not delete old output file {}", .0.display())]
    CannotDelete(PathBuf),

    #[error("Invalid URL map entry \"{0}\": expected prefix=url")]
    InvalidUrlMap(String),
}

/// Writes a set of warnings somewhere
pub trait Reporter {
    /// Writes the full report; output is flushed before returning
    fn write(
        &mut self,
        error_count: usize,
        warning_count: usize,
        warnings: &[Warning],
    ) -> Result<(), ReportError>;
}

/// Deletes a previous report at `path` so a new one can be written
pub fn prepare_output(path: &Path) -> Result<(), ReportError> {
    if path.is_file() {
        fs::remove_file(path).map_err(|err| {
            log::debug!("Cannot delete {}: {}", path.display(), err);
            ReportError::CannotDelete(path.to_path_buf())
        })?;
    }
    Ok(())
}

/// Buffered writer for a report file
pub fn create_output(path: &Path) -> Result<Box<dyn Write>, ReportError> {
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

/// Rewrites local file paths into URLs
///
/// Built from `prefix=url` pairs. Paths are compared in URL-encoded form,
/// and the unmatched remainder is appended to the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMap {
    entries: Vec<(String, String)>,
}

impl UrlMap {
    /// Parses `prefix=url[,prefix=url]`; `none` gives an empty map
    pub fn parse(spec: &str) -> Result<Self, ReportError> {
        let spec = spec.trim();
        if spec == "none" {
            return Ok(Self::default());
        }
        let mut entries = Vec::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (prefix, url) = pair
                .split_once('=')
                .ok_or_else(|| ReportError::InvalidUrlMap(pair.to_string()))?;
            entries.push((encode_url(prefix), url.to_string()));
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn url_for(&self, path: &Path) -> Option<String> {
        let encoded = encode_url(&path.to_string_lossy());
        self.entries.iter().find_map(|(prefix, url)| {
            encoded
                .strip_prefix(prefix.as_str())
                .map(|rest| format!("{}{}", url, rest.replace("%2F", "/")))
        })
    }
}

/// Form style URL encoding
pub fn encode_url(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'*' | b'_' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Copies images referenced by a report next to it
///
/// Files go into `<report name up to the first '.'>_files`, created on first
/// use. Only plain PNG files are bundled.
#[derive(Debug)]
pub struct ResourceBundler {
    dir: PathBuf,
    url_prefix: String,
    urls: HashMap<PathBuf, String>,
    names: HashMap<String, PathBuf>,
}

/// Attempts at finding a free name before giving up on a resource
const MAX_NAME_ATTEMPTS: usize = 100;

impl ResourceBundler {
    pub fn for_report(report: &Path) -> Self {
        let name = report
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.split('.').next().unwrap_or_default();
        let url_prefix = format!("{}_files", stem);
        let dir = report
            .parent()
            .map(|parent| parent.join(&url_prefix))
            .unwrap_or_else(|| PathBuf::from(&url_prefix));
        Self {
            dir,
            url_prefix,
            urls: HashMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// URL of an already bundled file
    pub fn url(&self, file: &Path) -> Option<&str> {
        self.urls.get(file).map(String::as_str)
    }

    /// Copies `file` into the resource folder, returning its URL
    ///
    /// Returns `Ok(None)` for files that are not bundled.
    pub fn add(&mut self, file: &Path) -> Result<Option<String>, ReportError> {
        if let Some(url) = self.urls.get(file) {
            return Ok(Some(url.clone()));
        }
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        let lower = name.to_lowercase();
        if !lower.ends_with(".png") || lower.ends_with(".9.png") {
            return Ok(None);
        }

        let mut candidate = name.to_string();
        let mut attempts = 0;
        while self.names.get(&candidate).is_some_and(|owner| owner != file) {
            attempts += 1;
            if attempts > MAX_NAME_ATTEMPTS {
                log::warn!("No free name for bundled resource {}", file.display());
                return Ok(None);
            }
            candidate.insert(0, '_');
        }

        fs::create_dir_all(&self.dir)?;
        fs::copy(file, self.dir.join(&candidate))?;

        let url = format!("{}/{}", self.url_prefix, encode_url(&candidate));
        self.names.insert(candidate, file.to_path_buf());
        self.urls.insert(file.to_path_buf(), url.clone());
        Ok(Some(url))
    }
}

/// Escapes text for HTML content and attribute values
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps `text` at `width` columns, keeping existing line breaks
pub fn wrap(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / width.max(1));
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut column = 0;
        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let len = word.chars().count();
            if column > 0 && column + 1 + len > width {
                out.push('\n');
                column = 0;
            } else if column > 0 {
                out.push(' ');
                column += 1;
            }
            out.push_str(word);
            column += len;
        }
    }
    out
}

/// "1 error", "2 warnings"
pub(crate) fn plural(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}
