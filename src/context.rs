//! Contexts handed to detectors, and the collector behind `report`

use crate::config::Configuration;
use crate::issue::Severity;
use crate::location::Location;
use crate::project::Project;
use crate::registry::{IssueRegistry, PARSER_ERROR};
use crate::scope::{ResourceFolderType, ScopeSet};
use crate::warning::{snippet, PathDisplay, Warning};
use crate::xml::{Document, Element, ParseError};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turns report calls into [`Warning`]s for one project
pub(crate) struct WarningCollector {
    registry: Arc<IssueRegistry>,
    configuration: Arc<dyn Configuration>,
    project: String,
    project_dir: PathBuf,
    paths: PathDisplay,
    show_lines: bool,
    sources: HashMap<PathBuf, Arc<str>>,
    warnings: Vec<Warning>,
}

impl WarningCollector {
    pub(crate) fn new(
        registry: Arc<IssueRegistry>,
        configuration: Arc<dyn Configuration>,
        project: &Project,
        paths: PathDisplay,
        show_lines: bool,
    ) -> Self {
        Self {
            registry,
            configuration,
            project: project.name().to_string(),
            project_dir: project.dir().to_path_buf(),
            paths,
            show_lines,
            sources: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Keeps the text of a scanned file so later reports can quote it
    pub(crate) fn remember_source(&mut self, file: &Path, source: Arc<str>) {
        self.sources.insert(file.to_path_buf(), source);
    }

    pub(crate) fn is_enabled(&self, issue_id: &str) -> bool {
        self.registry
            .issue(issue_id)
            .is_some_and(|issue| self.configuration.is_enabled(issue))
    }

    pub(crate) fn report(
        &mut self,
        issue_id: &str,
        location: Location,
        message: String,
        data: Option<String>,
    ) {
        let Some(issue) = self.registry.issue(issue_id).cloned() else {
            log::error!("Detector reported unknown issue {}", issue_id);
            debug_assert!(false, "Detector reported unknown issue {}", issue_id);
            return;
        };

        let severity = self.configuration.severity(&issue);
        if severity == Severity::Ignore {
            log::error!("Incorrect detector reported disabled issue {}", issue_id);
            debug_assert!(false, "Incorrect detector reported disabled issue {}", issue_id);
            return;
        }

        let mut warning = Warning::new(issue, message, severity);
        warning.project = self.project.clone();
        warning.project_dir = Some(self.project_dir.clone());
        warning.data = data;
        warning.path = Some(self.paths.display(&location.file));
        warning.file = Some(location.file.clone());
        if let Some(start) = location.start {
            warning.line = Some(start.line);
            warning.column = start.column;
            warning.offset = Some(start.offset);
        }

        let contents = self.sources.get(&location.file).cloned();
        if self.show_lines {
            if let (Some(contents), Some(line)) = (&contents, warning.line) {
                warning.error_line = snippet(contents, line, warning.column);
            }
        }
        warning.file_contents = contents;
        warning.location = Some(location);

        log::debug!(
            "{}: {} [{}]",
            warning.path.as_deref().unwrap_or(""),
            warning.message,
            warning.issue.id()
        );
        self.warnings.push(warning);
    }

    /// Reports a file that could not be parsed, unless parser errors are disabled
    pub(crate) fn report_parser_error(&mut self, file: &Path, error: &ParseError) {
        if !self.is_enabled(PARSER_ERROR) {
            log::debug!("Skipping unparseable file {}: {}", file.display(), error);
            return;
        }
        let location = Location::new(file, error.position(), None);
        self.report(PARSER_ERROR, location, error.to_string(), None);
    }

    pub(crate) fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// What a detector sees while checking a project or one of its files
pub struct Context<'a> {
    project: &'a Project,
    file: &'a Path,
    scope: ScopeSet,
    contents: Option<&'a str>,
    folder_type: Option<ResourceFolderType>,
    collector: &'a mut WarningCollector,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        project: &'a Project,
        file: &'a Path,
        scope: ScopeSet,
        collector: &'a mut WarningCollector,
    ) -> Self {
        Self {
            project,
            file,
            scope,
            contents: None,
            folder_type: None,
            collector,
        }
    }

    pub(crate) fn with_contents(mut self, contents: &'a str) -> Self {
        self.contents = Some(contents);
        self
    }

    pub(crate) fn with_folder_type(mut self, folder_type: Option<ResourceFolderType>) -> Self {
        self.folder_type = folder_type;
        self
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// The file being checked; the project directory for project-level calls
    pub fn file(&self) -> &'a Path {
        self.file
    }

    /// The scope of the current run
    pub fn scope(&self) -> ScopeSet {
        self.scope
    }

    pub fn contents(&self) -> Option<&'a str> {
        self.contents
    }

    pub fn folder_type(&self) -> Option<ResourceFolderType> {
        self.folder_type
    }

    pub fn is_enabled(&self, issue_id: &str) -> bool {
        self.collector.is_enabled(issue_id)
    }

    /// Location covering the current file
    pub fn file_location(&self) -> Location {
        Location::file(self.file)
    }

    pub fn report(&mut self, issue_id: &str, location: Location, message: impl Into<String>) {
        self.collector
            .report(issue_id, location, message.into(), None);
    }

    pub fn report_with_data(
        &mut self,
        issue_id: &str,
        location: Location,
        message: impl Into<String>,
        data: impl Into<String>,
    ) {
        self.collector
            .report(issue_id, location, message.into(), Some(data.into()));
    }
}

/// Context for an XML file, with access to its parsed document
pub struct XmlContext<'a> {
    context: Context<'a>,
    document: &'a Document,
}

impl<'a> XmlContext<'a> {
    pub(crate) fn new(context: Context<'a>, document: &'a Document) -> Self {
        Self { context, document }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn element_location(&self, element: Element<'_>) -> Location {
        element.location(self.context.file)
    }

    pub fn attribute_location(&self, element: Element<'_>, name: &str) -> Location {
        element.attribute_location(self.context.file, name)
    }
}

impl<'a> Deref for XmlContext<'a> {
    type Target = Context<'a>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for XmlContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultConfiguration;
    use crate::issue::{Category, Issue};
    use crate::location::Position;

    fn collector() -> WarningCollector {
        let registry = IssueRegistry::builder()
            .issue(Issue::new(
                "Loud",
                "summary",
                "explanation",
                Category::correctness(),
                5,
                Severity::Error,
                ScopeSet::RESOURCE_FILE_SCOPE,
            ))
            .build();
        WarningCollector::new(
            Arc::new(registry),
            Arc::new(DefaultConfiguration),
            &Project::new(PathBuf::from("/work/app")),
            PathDisplay::new(&[PathBuf::from("/work/app")], false),
            true,
        )
    }

    #[test]
    fn test_report_builds_warning_with_snippet() {
        let mut collector = collector();
        let file = PathBuf::from("/work/app/res/values/strings.xml");
        collector.remember_source(&file, Arc::from("<resources>\n  <string/>\n</resources>"));
        let project = Project::new(PathBuf::from("/work/app"));

        let mut ctx = Context::new(&project, &file, ScopeSet::RESOURCE_FILE_SCOPE, &mut collector);
        assert!(ctx.is_enabled("Loud"));
        ctx.report_with_data(
            "Loud",
            Location::new(&file, Position::new(1, 2, 14), None),
            "Too loud",
            "string",
        );

        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        let warning = &warnings[0];
        assert_eq!(warning.severity, Severity::Error);
        assert_eq!(warning.project, "app");
        assert_eq!(warning.project_dir, Some(PathBuf::from("/work/app")));
        assert_eq!(warning.path.as_deref(), Some("app/res/values/strings.xml"));
        assert_eq!(warning.line, Some(1));
        assert_eq!(warning.data.as_deref(), Some("string"));
        assert_eq!(
            warning.error_line.as_deref(),
            Some("<resources>\n  <string/>\n  ^\n</resources>\n")
        );
    }

    #[test]
    fn test_parser_error_reported_at_error_position() {
        let mut collector = collector();
        let file = PathBuf::from("/work/app/AndroidManifest.xml");
        let error = crate::xml::parse("<manifest>\n<oops></manifest>").unwrap_err();
        collector.report_parser_error(&file, &error);
        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].issue.id(), PARSER_ERROR);
        assert!(warnings[0].line.is_some());
    }
}
