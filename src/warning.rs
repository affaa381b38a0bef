//! Reported warnings, their ordering and source snippets

use crate::issue::{Issue, Severity};
use crate::location::{source_lines, Location};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Width a tab expands to in snippets
const TAB_WIDTH: usize = 4;

/// A single reported problem
///
/// Warnings are created once per report call and never modified afterwards.
/// The snippet is computed up front so reporters only format.
#[derive(Debug, Clone)]
pub struct Warning {
    pub issue: Arc<Issue>,
    pub message: String,
    pub severity: Severity,
    /// Name of the project the warning belongs to
    pub project: String,
    /// Directory of that project; names alone are not unique
    pub project_dir: Option<PathBuf>,
    /// Detector supplied data attached to the report
    pub data: Option<String>,
    pub file: Option<PathBuf>,
    /// Path as shown to the user
    pub path: Option<String>,
    /// 0-based line
    pub line: Option<usize>,
    /// 0-based column
    pub column: Option<usize>,
    pub offset: Option<usize>,
    /// Source snippet around the reported line with a `^` marker
    pub error_line: Option<String>,
    pub file_contents: Option<Arc<str>>,
    pub location: Option<Location>,
}

impl Warning {
    pub fn new(issue: Arc<Issue>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            issue,
            message: message.into(),
            severity,
            project: String::new(),
            project_dir: None,
            data: None,
            file: None,
            path: None,
            line: None,
            column: None,
            offset: None,
            error_line: None,
            file_contents: None,
            location: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Ord for Warning {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.issue, &other.issue);
        a.category()
            .full_name()
            .cmp(b.category().full_name())
            .then_with(|| b.priority().cmp(&a.priority()))
            .then_with(|| a.id().cmp(b.id()))
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.line.cmp(&other.line))
            .then_with(|| self.column.cmp(&other.column))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl PartialOrd for Warning {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Warning {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Warning {}

/// Warnings sharing one issue
#[derive(Debug)]
pub struct WarningGroup<'a> {
    pub issue: &'a Arc<Issue>,
    pub warnings: Vec<&'a Warning>,
}

/// Groups warnings by issue id, in order of first appearance
///
/// Grouping is by key, so an unsorted input still yields one group per issue.
pub fn group_by_issue(warnings: &[Warning]) -> Vec<WarningGroup<'_>> {
    let mut groups: Vec<WarningGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for warning in warnings {
        match index.get(warning.issue.id()) {
            Some(&i) => groups[i].warnings.push(warning),
            None => {
                index.insert(warning.issue.id(), groups.len());
                groups.push(WarningGroup {
                    issue: &warning.issue,
                    warnings: vec![warning],
                });
            }
        }
    }
    groups
}

/// Builds the snippet shown under a warning
///
/// Shows the line before, the reported line and the line after, with a
/// caret under the reported column. Tabs are expanded to spaces.
pub fn snippet(contents: &str, line: usize, column: Option<usize>) -> Option<String> {
    let lines = source_lines(contents);
    let reported = *lines.get(line)?;

    let mut out = String::new();
    if line > 0 {
        out.push_str(&expand_tabs(lines[line - 1]));
        out.push('\n');
    }
    out.push_str(&expand_tabs(reported));
    out.push('\n');
    if let Some(column) = column {
        let width: usize = reported
            .chars()
            .take(column)
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();
        out.push_str(&" ".repeat(width));
        out.push_str("^\n");
    }
    if let Some(next) = lines.get(line + 1) {
        out.push_str(&expand_tabs(next));
        out.push('\n');
    }
    Some(out)
}

fn expand_tabs(line: &str) -> String {
    line.replace('\t', &" ".repeat(TAB_WIDTH))
}

/// How file paths are shown in reports
#[derive(Debug, Clone, Default)]
pub struct PathDisplay {
    base: Option<PathBuf>,
    full_path: bool,
}

impl PathDisplay {
    /// Paths relative to the common parent of `inputs`, or full paths
    pub fn new(inputs: &[PathBuf], full_path: bool) -> Self {
        let parents: Vec<PathBuf> = inputs
            .iter()
            .map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default())
            .collect();
        Self {
            base: common_prefix(&parents),
            full_path,
        }
    }

    pub fn full() -> Self {
        Self {
            base: None,
            full_path: true,
        }
    }

    pub fn display(&self, path: &Path) -> String {
        if !self.full_path {
            if let Some(base) = &self.base {
                if let Ok(relative) = path.strip_prefix(base) {
                    if !relative.as_os_str().is_empty() {
                        return relative.display().to_string();
                    }
                }
            }
        }
        path.display().to_string()
    }
}

/// Longest common ancestor of `paths`, compared component by component
pub fn common_prefix(paths: &[PathBuf]) -> Option<PathBuf> {
    let first = paths.first()?;
    let mut prefix: Vec<Component<'_>> = first.components().collect();
    for path in &paths[1..] {
        let shared = prefix
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Category;
    use crate::scope::ScopeSet;
    use pretty_assertions::assert_eq;

    fn issue(id: &str, category: Category, priority: u8) -> Arc<Issue> {
        Arc::new(Issue::new(
            id,
            "summary",
            "explanation",
            category,
            priority,
            Severity::Warning,
            ScopeSet::RESOURCE_FILE_SCOPE,
        ))
    }

    fn warning(issue: &Arc<Issue>, path: &str, line: usize) -> Warning {
        let mut warning = Warning::new(issue.clone(), "message", Severity::Warning);
        warning.path = Some(path.to_string());
        warning.line = Some(line);
        warning
    }

    #[test]
    fn test_ordering_priority_then_file_then_line() {
        let low = issue("Low", Category::correctness(), 5);
        let high = issue("High", Category::correctness(), 9);
        let mut warnings = vec![
            warning(&low, "b.xml", 1),
            warning(&high, "z.xml", 3),
            warning(&high, "a.xml", 7),
            warning(&high, "a.xml", 2),
        ];
        warnings.sort();

        let order: Vec<_> = warnings
            .iter()
            .map(|w| (w.issue.id(), w.path.as_deref().unwrap(), w.line.unwrap()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("High", "a.xml", 2),
                ("High", "a.xml", 7),
                ("High", "z.xml", 3),
                ("Low", "b.xml", 1),
            ]
        );
    }

    #[test]
    fn test_ordering_by_category_first() {
        let perf = issue("Perf", Category::performance(), 9);
        let correct = issue("Correct", Category::correctness(), 1);
        let mut warnings = vec![warning(&perf, "a.xml", 1), warning(&correct, "a.xml", 1)];
        warnings.sort();
        assert_eq!(warnings[0].issue.id(), "Correct");
    }

    #[test]
    fn test_ordering_is_total() {
        let a = issue("A", Category::correctness(), 5);
        let mut first = warning(&a, "a.xml", 1);
        let second = warning(&a, "a.xml", 1);
        assert_eq!(first.cmp(&second), Ordering::Equal);
        first.message = "another".to_string();
        assert_ne!(first.cmp(&second), Ordering::Equal);
        assert_eq!(first.cmp(&second), second.cmp(&first).reverse());
    }

    #[test]
    fn test_grouping_by_key_survives_unsorted_input() {
        let a = issue("A", Category::correctness(), 5);
        let b = issue("B", Category::correctness(), 5);
        let warnings = vec![
            warning(&a, "1.xml", 1),
            warning(&b, "2.xml", 1),
            warning(&a, "3.xml", 1),
        ];
        let groups = group_by_issue(&warnings);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].issue.id(), "A");
        assert_eq!(groups[0].warnings.len(), 2);
        assert_eq!(groups[1].warnings.len(), 1);
    }

    #[test]
    fn test_snippet_with_context_and_caret() {
        let contents = "<a>\n\t<b c=\"1\"/>\n</a>\n";
        let snippet = snippet(contents, 1, Some(2)).unwrap();
        assert_eq!(snippet, "<a>\n    <b c=\"1\"/>\n     ^\n</a>\n");
    }

    #[test]
    fn test_snippet_edges() {
        let contents = "only line";
        assert_eq!(snippet(contents, 0, None).unwrap(), "only line\n");
        assert_eq!(snippet(contents, 0, Some(5)).unwrap(), "only line\n     ^\n");
        assert!(snippet(contents, 3, Some(0)).is_none());
    }

    #[test]
    fn test_snippet_matches_parser_lines_for_lone_cr() {
        let contents = "<a>\r<b x='1px'/>\r</a>";
        let document = crate::xml::parse(contents).unwrap();
        let b = document.elements_by_tag_name("b").next().unwrap();
        let position = b.start();
        assert_eq!(position.line, 1);

        let snippet = snippet(contents, position.line, position.column).unwrap();
        assert_eq!(snippet, "<a>\n<b x='1px'/>\n^\n</a>\n");
    }

    #[test]
    fn test_path_display() {
        let inputs = vec![PathBuf::from("/work/app"), PathBuf::from("/work/lib")];
        let display = PathDisplay::new(&inputs, false);
        assert_eq!(
            display.display(Path::new("/work/app/res/layout/main.xml")),
            "app/res/layout/main.xml"
        );
        assert_eq!(display.display(Path::new("/elsewhere/x.xml")), "/elsewhere/x.xml");

        let full = PathDisplay::new(&inputs, true);
        assert_eq!(
            full.display(Path::new("/work/app/res/layout/main.xml")),
            "/work/app/res/layout/main.xml"
        );
    }

    #[test]
    fn test_common_prefix() {
        let paths = vec![
            PathBuf::from("/a/b/c"),
            PathBuf::from("/a/b/d/e"),
            PathBuf::from("/a/b"),
        ];
        assert_eq!(common_prefix(&paths), Some(PathBuf::from("/a/b")));
        assert_eq!(common_prefix(&[]), None);
    }
}
