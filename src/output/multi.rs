//! One HTML report per project plus an index page

use super::{
    create_output, escape_html, prepare_output, HtmlReporter, ReportError, Reporter, UrlMap,
};
use crate::driver::CheckedProject;
use crate::warning::{PathDisplay, Warning};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

const INDEX_STEM: &str = "index";
const INDEX_FILE: &str = "index.html";

/// Per project totals shown on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectSummary {
    name: String,
    dir: PathBuf,
    file: String,
    errors: usize,
    warnings: usize,
}

/// Writes `<project>.html` for each project into a directory
///
/// Projects are told apart by directory. When two projects share a name the
/// later one, in directory order, gets a numbered page such as `app_2.html`.
pub struct MultiProjectHtmlReporter {
    dir: PathBuf,
    /// Projects to report on even when they have no warnings
    projects: Vec<CheckedProject>,
    simple: bool,
    urls: UrlMap,
    paths: PathDisplay,
}

impl MultiProjectHtmlReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            projects: Vec::new(),
            simple: false,
            urls: UrlMap::default(),
            paths: PathDisplay::full(),
        }
    }

    pub fn with_projects(mut self, projects: Vec<CheckedProject>) -> Self {
        self.projects = projects;
        self
    }

    pub fn simple(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    pub fn with_url_map(mut self, urls: UrlMap) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_paths(mut self, paths: PathDisplay) -> Self {
        self.paths = paths;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_project(
        &self,
        project: &CheckedProject,
        stem: &str,
        warnings: &[Warning],
    ) -> Result<ProjectSummary, ReportError> {
        let name = project.name.as_str();
        let file = format!("{}.html", stem);
        let path = self.dir.join(&file);
        prepare_output(&path)?;

        let errors = warnings.iter().filter(|w| w.is_error()).count();
        let count = warnings.len() - errors;

        let mut reporter = HtmlReporter::new(create_output(&path)?, &path)
            .with_title(format!("Lint Report for {}", name))
            .simple(self.simple)
            .with_url_map(self.urls.clone())
            .with_paths(self.paths.clone());
        reporter.write(errors, count, warnings)?;
        log::info!("Wrote HTML report for {} to {}", name, path.display());

        Ok(ProjectSummary {
            name: name.to_string(),
            dir: project.dir.clone(),
            file,
            errors,
            warnings: count,
        })
    }

    fn write_index(&self, mut summaries: Vec<ProjectSummary>) -> Result<(), ReportError> {
        summaries.sort_by(|a, b| {
            b.errors
                .cmp(&a.errors)
                .then_with(|| b.warnings.cmp(&a.warnings))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.file.cmp(&b.file))
        });

        let path = self.dir.join(INDEX_FILE);
        prepare_output(&path)?;
        let mut out = create_output(&path)?;
        let html = render_index(&summaries);
        let written = out.write_all(html.as_bytes());
        let flushed = out.flush();
        written?;
        flushed?;
        Ok(())
    }
}

impl Reporter for MultiProjectHtmlReporter {
    fn write(
        &mut self,
        _error_count: usize,
        _warning_count: usize,
        warnings: &[Warning],
    ) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.dir)?;

        let mut by_project: BTreeMap<PathBuf, (CheckedProject, Vec<Warning>)> = self
            .projects
            .iter()
            .map(|project| (project.dir.clone(), (project.clone(), Vec::new())))
            .collect();
        for warning in warnings {
            let dir = warning
                .project_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&warning.project));
            by_project
                .entry(dir.clone())
                .or_insert_with(|| {
                    let project = CheckedProject {
                        name: warning.project.clone(),
                        dir,
                    };
                    (project, Vec::new())
                })
                .1
                .push(warning.clone());
        }

        let mut taken = HashSet::from([INDEX_STEM.to_string()]);
        let mut summaries = Vec::with_capacity(by_project.len());
        for (project, project_warnings) in by_project.values() {
            let stem = page_stem(&project.name, &mut taken);
            summaries.push(self.write_project(project, &stem, project_warnings)?);
        }
        self.write_index(summaries)
    }
}

/// File name stem for a project page, unique among `taken`
///
/// Compared case-insensitively so pages stay distinct on case-insensitive
/// file systems.
fn page_stem(name: &str, taken: &mut HashSet<String>) -> String {
    let base: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let base = if base.is_empty() { "project".to_string() } else { base };

    let mut stem = base.clone();
    let mut suffix = 2;
    while !taken.insert(stem.to_lowercase()) {
        stem = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    stem
}

fn render_index(summaries: &[ProjectSummary]) -> String {
    let mut rows = String::new();
    for summary in summaries {
        let _ = writeln!(
            rows,
            "<tr><td><a href=\"{}\" title=\"{}\">{}</a></td><td class=\"count\">{}</td><td class=\"count\">{}</td></tr>",
            escape_html(&summary.file),
            escape_html(&summary.dir.display().to_string()),
            escape_html(&summary.name),
            summary.errors,
            summary.warnings
        );
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Lint Report</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }}
        table {{ border-collapse: collapse; }}
        th, td {{ padding: 4px 12px; border-bottom: 1px solid #eee; }}
        .count {{ text-align: right; }}
    </style>
</head>
<body>
    <h1>Lint Report</h1>
    <p class="timestamp">Check performed at {timestamp}.</p>
    <table>
        <tr><th>Project</th><th>Errors</th><th>Warnings</th></tr>
{rows}    </table>
</body>
</html>
"#,
        timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        rows = rows
    )
}
