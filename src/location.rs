//! Source positions and locations

use std::fmt;
use std::path::{Path, PathBuf};

/// A position in a source file
///
/// Lines and columns are 0-based. Offsets are byte offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    /// Column in characters, `None` when it could not be derived
    pub column: Option<usize>,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column: Some(column),
            offset,
        }
    }

    /// Position with a known line and offset but no column
    pub fn without_column(line: usize, offset: usize) -> Self {
        Self {
            line,
            column: None,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}", self.line + 1, column + 1),
            None => write!(f, "{}", self.line + 1),
        }
    }
}

/// A file plus an optional range in it
///
/// Locations can be chained through `secondary` to point at related places,
/// for example all the density variants of an icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub start: Option<Position>,
    pub end: Option<Position>,
    /// Description of this location when shown as a secondary location
    pub message: Option<String>,
    pub secondary: Option<Box<Location>>,
}

impl Location {
    /// A location covering a whole file
    pub fn file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            start: None,
            end: None,
            message: None,
            secondary: None,
        }
    }

    pub fn new(file: impl Into<PathBuf>, start: Position, end: Option<Position>) -> Self {
        Self {
            file: file.into(),
            start: Some(start),
            end,
            message: None,
            secondary: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_secondary(mut self, secondary: Option<Location>) -> Self {
        self.secondary = secondary.map(Box::new);
        self
    }

    /// Links `locations` into a single chain, keeping their order
    pub fn chain(locations: Vec<Location>) -> Option<Location> {
        locations
            .into_iter()
            .rev()
            .fold(None, |next, location| Some(location.with_secondary(next)))
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn line(&self) -> Option<usize> {
        self.start.map(|p| p.line)
    }

    /// Iterates over this location followed by every secondary location
    pub fn iter(&self) -> LocationIter<'_> {
        LocationIter {
            current: Some(self),
        }
    }

    /// The secondary locations only
    pub fn secondaries(&self) -> LocationIter<'_> {
        LocationIter {
            current: self.secondary.as_deref(),
        }
    }
}

pub struct LocationIter<'a> {
    current: Option<&'a Location>,
}

impl<'a> Iterator for LocationIter<'a> {
    type Item = &'a Location;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current.secondary.as_deref();
        Some(current)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(f, "{}:{}", self.file.display(), start),
            None => write!(f, "{}", self.file.display()),
        }
    }
}

/// Splits `text` into lines ending at `\n`, `\r\n` or a lone `\r`
///
/// Line numbers match the ones [`Position`]s carry. A trailing terminator
/// does not start an extra empty line.
pub fn source_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_lines_terminators() {
        assert_eq!(source_lines("a\rb\r\nc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(source_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(source_lines("\r\r"), vec!["", ""]);
        assert!(source_lines("").is_empty());
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(0, 4, 4).to_string(), "1:5");
        assert_eq!(Position::without_column(9, 120).to_string(), "10");
    }

    #[test]
    fn test_chain_keeps_order() {
        let chain = Location::chain(vec![
            Location::file("res/drawable-hdpi/icon.png"),
            Location::file("res/drawable-mdpi/icon.png"),
            Location::file("res/drawable-ldpi/icon.png"),
        ])
        .unwrap();

        let files: Vec<_> = chain.iter().map(|l| l.file.clone()).collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("res/drawable-hdpi/icon.png"),
                PathBuf::from("res/drawable-mdpi/icon.png"),
                PathBuf::from("res/drawable-ldpi/icon.png"),
            ]
        );
        assert_eq!(chain.secondaries().count(), 2);
    }

    #[test]
    fn test_empty_chain() {
        assert!(Location::chain(Vec::new()).is_none());
    }
}
