//! HTML report
//!
//! Generates a self-contained page: inline CSS, a little JavaScript to
//! reveal long occurrence lists, and copies of the images that warnings
//! point at.

use super::text::summary;
use super::{escape_html, wrap, ReportError, Reporter, ResourceBundler, UrlMap};
use crate::issue::Severity;
use crate::location::{source_lines, Location};
use crate::warning::{group_by_issue, PathDisplay, Warning, WarningGroup};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Occurrences shown per issue before the rest are folded away
pub const SPLIT_LIMIT: usize = 8;

/// Lines of source shown around a reported line
const CODE_WINDOW: usize = 3;

/// Column the explanation text is wrapped at
const EXPLANATION_WIDTH: usize = 70;

/// HTML reporter
pub struct HtmlReporter {
    out: Box<dyn Write>,
    /// Report title
    title: String,
    /// No scripts, no folding, no bundled images
    simple: bool,
    urls: UrlMap,
    bundler: Option<ResourceBundler>,
    paths: PathDisplay,
}

impl HtmlReporter {
    /// Reporter writing to `out`, bundling images next to `report`
    pub fn new(out: Box<dyn Write>, report: &Path) -> Self {
        Self {
            out,
            title: "Lint Report".to_string(),
            simple: false,
            urls: UrlMap::default(),
            bundler: Some(ResourceBundler::for_report(report)),
            paths: PathDisplay::full(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Simple mode shows every occurrence and bundles nothing
    pub fn simple(mut self, simple: bool) -> Self {
        self.simple = simple;
        if simple {
            self.bundler = None;
        }
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

    /// Link target for a file, preferring a bundled copy
    fn url_for(&self, file: &Path) -> Option<String> {
        self.bundler
            .as_ref()
            .and_then(|bundler| bundler.url(file))
            .map(str::to_string)
            .or_else(|| self.urls.url_for(file))
    }

    /// Image URL for a file, bundling it first when possible
    fn image_url(&mut self, file: &Path) -> Option<String> {
        if !is_image(file) {
            return None;
        }
        if let Some(bundler) = &mut self.bundler {
            match bundler.add(file) {
                Ok(Some(url)) => return Some(url),
                Ok(None) => {}
                Err(err) => log::warn!("Cannot bundle {}: {}", file.display(), err),
            }
        }
        self.urls.url_for(file)
    }

    fn render(&mut self, error_count: usize, warning_count: usize, warnings: &[Warning]) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
{script}</head>
<body>
    <header>
        <h1>{title}</h1>
        <p class="timestamp">Check performed at {timestamp}.</p>
        <p class="summary">{summary}</p>
    </header>
"#,
            title = escape_html(&self.title),
            css = CSS,
            script = if self.simple {
                String::new()
            } else {
                format!("    <script>{}</script>\n", SCRIPT)
            },
            timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            summary = escape_html(&found_line(error_count, warning_count)),
        );

        let groups = group_by_issue(warnings);
        if !groups.is_empty() {
            html.push_str(&table_of_contents(&groups));
        }
        for group in &groups {
            let section = self.issue_section(group);
            html.push_str(&section);
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn issue_section(&mut self, group: &WarningGroup<'_>) -> String {
        let issue = group.issue;
        let id = escape_html(issue.id());
        let mut html = String::new();
        let _ = writeln!(html, "<a name=\"{}\"></a>", id);
        html.push_str("<section class=\"issue\">\n");
        let _ = writeln!(
            html,
            "<h2><span class=\"id\">{}</span>: {}</h2>",
            id,
            escape_html(issue.summary())
        );

        html.push_str("<div class=\"warningslist\">\n");
        let count = group.warnings.len();
        for (i, warning) in group.warnings.iter().enumerate() {
            if !self.simple && i == SPLIT_LIMIT && count > SPLIT_LIMIT {
                let _ = writeln!(
                    html,
                    "<button id=\"{id}Link\" onclick=\"reveal('{id}');\">+ {} More Occurrences...</button>",
                    count - SPLIT_LIMIT,
                    id = id
                );
                let _ = writeln!(html, "<div id=\"{}\" style=\"display: none\">", id);
            }
            let occurrence = self.occurrence(warning);
            html.push_str(&occurrence);
        }
        if !self.simple && count > SPLIT_LIMIT {
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n");

        html.push_str(&metadata(group));
        html.push_str("</section>\n");
        html
    }

    fn occurrence(&mut self, warning: &Warning) -> String {
        let mut html = String::from("<div class=\"occurrence\">\n");

        let images = match &warning.location {
            Some(location) => self.images(location),
            None => Vec::new(),
        };

        let path = warning.path.clone().or_else(|| {
            warning
                .file
                .as_deref()
                .map(|file| self.paths.display(file))
        });
        if let Some(path) = &path {
            html.push_str("<span class=\"location\">");
            let url = warning.file.as_deref().and_then(|file| self.url_for(file));
            match url {
                Some(url) => {
                    let _ = write!(
                        html,
                        "<a href=\"{}\">{}</a>",
                        escape_html(&url),
                        escape_html(path)
                    );
                }
                None => html.push_str(&escape_html(path)),
            }
            html.push(':');
            if let Some(line) = warning.line {
                let _ = write!(html, "{}:", line + 1);
            }
            html.push_str("</span> ");
        }

        let single_image = images.len() == 1;
        if single_image {
            let _ = write!(
                html,
                "<img class=\"single\" border=\"0\" align=\"right\" src=\"{}\" />",
                escape_html(&images[0].1)
            );
        }
        let _ = write!(
            html,
            "<span class=\"message\">{}</span>",
            escape_html(&warning.message)
        );
        html.push_str(if single_image {
            "<br clear=\"right\"/>\n"
        } else {
            "<br/>\n"
        });

        if let (Some(contents), Some(line)) = (&warning.file_contents, warning.line) {
            html.push_str(&code_block(contents, line));
        }

        if images.len() > 1 {
            html.push_str(&image_table(&images));
        }
        html.push_str("</div>\n");
        html
    }

    /// Image URLs along a location chain, keyed by density folder name
    fn images(&mut self, location: &Location) -> Vec<(String, String)> {
        let mut images: Vec<(String, String)> = Vec::new();
        for linked in location.iter() {
            let Some(url) = self.image_url(&linked.file) else {
                continue;
            };
            let folder = linked
                .file
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            images.push((folder, url));
        }
        images.sort_by_key(|(folder, _)| density_rank(folder));
        images
    }
}

impl Reporter for HtmlReporter {
    fn write(
        &mut self,
        error_count: usize,
        warning_count: usize,
        warnings: &[Warning],
    ) -> Result<(), ReportError> {
        let html = self.render(error_count, warning_count, warnings);
        let written = self.out.write_all(html.as_bytes());
        let flushed = self.out.flush();
        written?;
        flushed?;
        Ok(())
    }
}

fn found_line(error_count: usize, warning_count: usize) -> String {
    if error_count == 0 && warning_count == 0 {
        summary(0, 0)
    } else {
        format!("{} found:", summary(error_count, warning_count))
    }
}

fn is_image(file: &Path) -> bool {
    file.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ["png", "gif", "jpg", "jpeg"]
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Sort key putting the highest densities first
fn density_rank(folder: &str) -> u8 {
    if folder.contains("-xhdpi") {
        0
    } else if folder.contains("-hdpi") {
        1
    } else if folder.contains("-mdpi") {
        2
    } else if folder.contains("-ldpi") {
        3
    } else {
        4
    }
}

/// Issue list grouped under category headings
fn table_of_contents(groups: &[WarningGroup<'_>]) -> String {
    let mut html = String::from("<nav class=\"toc\">\n<table>\n");
    let mut category = "";
    for group in groups {
        let full_name = group.issue.category().full_name();
        if full_name != category {
            category = full_name;
            let _ = writeln!(
                html,
                "<tr><td colspan=\"3\" class=\"category\">{}</td></tr>",
                escape_html(full_name)
            );
        }
        let _ = writeln!(
            html,
            "<tr><td class=\"count\">{}</td><td class=\"{}\"></td><td><a href=\"#{id}\">{id}</a>: {}</td></tr>",
            group.warnings.len(),
            severity_class(group.warnings[0].severity),
            escape_html(group.issue.summary()),
            id = escape_html(group.issue.id())
        );
    }
    html.push_str("</table>\n</nav>\n");
    html
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Informational | Severity::Ignore => "info",
    }
}

/// Source lines around `line`, with the reported line highlighted
fn code_block(contents: &str, line: usize) -> String {
    let lines = source_lines(contents);
    if line >= lines.len() {
        return String::new();
    }
    let first = line.saturating_sub(CODE_WINDOW);
    let last = (line + CODE_WINDOW).min(lines.len() - 1);

    let mut html = String::from("<pre class=\"errorlines\">\n");
    for (index, text) in lines.iter().enumerate().take(last + 1).skip(first) {
        let number = format!("<span class=\"lineno\">{:4}</span> ", index + 1);
        if index == line {
            let _ = writeln!(
                html,
                "<span class=\"errorline\">{}{}</span>",
                number,
                escape_html(text)
            );
        } else {
            let _ = writeln!(html, "{}{}", number, escape_html(text));
        }
    }
    html.push_str("</pre>\n");
    html
}

fn image_table(images: &[(String, String)]) -> String {
    let mut html = String::from("<table class=\"images\" border=\"0\"><tr>");
    for (folder, _) in images {
        let header = folder
            .split_once("drawable-")
            .map_or(folder.as_str(), |(_, density)| density);
        let _ = write!(html, "<th>{}</th>", escape_html(header));
    }
    html.push_str("</tr>\n<tr>");
    for (_, url) in images {
        let url = escape_html(url);
        let _ = write!(
            html,
            "<td><a href=\"{url}\"><img border=\"0\" align=\"top\" src=\"{url}\" /></a></td>",
            url = url
        );
    }
    html.push_str("</tr></table>\n");
    html
}

fn metadata(group: &WarningGroup<'_>) -> String {
    let issue = group.issue;
    let severity = group.warnings[0].severity;
    let mut html = String::from("<div class=\"metadata\">\n");
    let _ = writeln!(html, "Id: <code>{}</code><br/>", escape_html(issue.id()));
    let _ = writeln!(html, "Priority: {} / 10<br/>", issue.priority());
    let _ = writeln!(html, "Category: {}<br/>", escape_html(issue.category().full_name()));
    let _ = writeln!(
        html,
        "Severity: <span class=\"{}\">{}</span><br/>",
        severity_class(severity),
        severity.description()
    );

    let explanation = escape_html(&wrap(issue.explanation(), EXPLANATION_WIDTH));
    let _ = writeln!(
        html,
        "<div class=\"explanation\">{}</div>",
        explanation.replace('\n', "<br/>\n")
    );
    if let Some(url) = issue.more_info() {
        let url = escape_html(url);
        let _ = writeln!(
            html,
            "<div class=\"moreinfo\">More info: <a href=\"{url}\">{url}</a></div>",
            url = url
        );
    }
    let _ = writeln!(
        html,
        "To suppress this error, run lint with <code>--disable {}</code><br/>",
        escape_html(issue.id())
    );
    html.push_str("</div>\n");
    html
}

const SCRIPT: &str = r#"
function reveal(id) {
    if (document.getElementById) {
        document.getElementById(id).style.display = 'block';
        document.getElementById(id + 'Link').style.display = 'none';
    }
}
"#;

const CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
    line-height: 1.5;
    color: #333;
    max-width: 1200px;
    margin: 0 auto;
    padding: 20px;
}

header {
    border-bottom: 2px solid #1976d2;
    margin-bottom: 20px;
}

.timestamp, .summary { color: #666; }

.toc table { border-collapse: collapse; margin-bottom: 30px; }
.toc td { padding: 2px 8px; }
.toc .category { font-weight: bold; padding-top: 12px; }
.toc .count { text-align: right; }
.toc .error { background: #d32f2f; width: 8px; }
.toc .warning { background: #ff9800; width: 8px; }
.toc .info { background: #2196f3; width: 8px; }

.issue {
    border: 1px solid #ddd;
    border-radius: 6px;
    padding: 12px 20px;
    margin-bottom: 24px;
}

.id { font-family: monospace; }
.location { font-weight: bold; }
.occurrence { margin-bottom: 12px; }

.errorlines {
    font-family: monospace;
    background: #f5f5f5;
    border-left: 3px solid #ddd;
    padding: 6px;
    overflow-x: auto;
}

.lineno { color: #999; }
.errorline { font-weight: bold; background: #ffebee; }

.metadata {
    font-size: 0.9em;
    border-top: 1px solid #eee;
    padding-top: 8px;
}

.explanation { margin: 8px 0; }
.error { color: #d32f2f; }
.warning { color: #e65100; }
.info { color: #1976d2; }
"#;
