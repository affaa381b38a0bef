//! Lint driver
//!
//! Maps input paths to projects, runs the enabled detectors over each
//! project's manifest, resource files and ProGuard configuration, and
//! collects what they report.

use crate::client::LintClient;
use crate::context::{Context, WarningCollector, XmlContext};
use crate::issue::Severity;
use crate::project::{compute_projects, is_resource_file, Project};
use crate::registry::{IssueRegistry, ScopedDetector};
use crate::scope::{has_extension, ResourceFolderType, Scope, ScopeSet};
use crate::visitor::XmlVisitor;
use crate::warning::{PathDisplay, Warning};
use crate::xml;
use crate::ERRNO_ERRORS;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Cooperative cancellation flag shared with the host
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Progress notifications sent while a run is in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintEvent {
    Starting,
    ScanningProject(String),
    ScanningFile(PathBuf),
    /// Results for these issues in `file` are about to be recomputed
    ClearMarkers { file: PathBuf, issues: Vec<String> },
    Canceled,
    Completed,
}

/// Receives [`LintEvent`]s
pub trait LintListener {
    fn update(&mut self, event: &LintEvent);
}

/// Driver settings
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Show absolute paths instead of paths relative to the inputs
    pub full_path: bool,

    /// Attach source snippets to warnings
    pub show_lines: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            full_path: false,
            show_lines: true,
        }
    }
}

/// A project visited by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedProject {
    pub name: String,
    pub dir: PathBuf,
}

/// Result of a lint run
#[derive(Debug, Default)]
pub struct LintResult {
    /// All warnings, sorted
    pub warnings: Vec<Warning>,

    /// Warnings with error severity
    pub error_count: usize,

    /// Warnings with warning or informational severity
    pub warning_count: usize,

    /// Whether any error severity warning was reported
    pub has_fatal: bool,

    /// Files read and checked
    pub files_checked: usize,

    /// Whether the run was canceled before completion
    pub canceled: bool,

    /// Processing duration
    pub duration: Duration,

    /// How the warnings' paths were displayed
    pub paths: PathDisplay,

    projects: Vec<CheckedProject>,
}

impl LintResult {
    /// The projects that were checked, in the order they ran
    pub fn projects(&self) -> &[CheckedProject] {
        &self.projects
    }

    pub fn project_names(&self) -> Vec<&str> {
        self.projects.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Process exit code for this result
    pub fn exit_code(&self) -> i32 {
        if self.has_fatal {
            ERRNO_ERRORS
        } else {
            0
        }
    }

    fn finish(&mut self) {
        self.warnings.sort();
        self.error_count = 0;
        self.warning_count = 0;
        for warning in &self.warnings {
            match warning.severity {
                Severity::Error => self.error_count += 1,
                Severity::Warning | Severity::Informational => self.warning_count += 1,
                Severity::Ignore => {}
            }
        }
        self.has_fatal = self.error_count > 0;
    }
}

/// Runs detectors over projects
pub struct LintDriver {
    registry: Arc<IssueRegistry>,
    client: Box<dyn LintClient>,
    options: DriverOptions,
    listeners: Vec<Box<dyn LintListener>>,
    cancel: CancelToken,
}

impl LintDriver {
    pub fn new(registry: Arc<IssueRegistry>, client: Box<dyn LintClient>) -> Self {
        Self {
            registry,
            client,
            options: DriverOptions::default(),
            listeners: Vec::new(),
            cancel: CancelToken::default(),
        }
    }

    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn LintListener>) {
        self.listeners.push(listener);
    }

    /// Token that cancels the current run
    ///
    /// A cancel requested before [`analyze`](Self::analyze) is called stops
    /// that run before any project is checked. The token is cleared when a
    /// run ends.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &Arc<IssueRegistry> {
        &self.registry
    }

    /// Checks `files`
    ///
    /// With `scope` set to `None`, each project's scope is inferred from
    /// what was asked for: a project directory gets a full check, single
    /// files only their own.
    pub fn analyze(&mut self, files: &[PathBuf], scope: Option<ScopeSet>) -> LintResult {
        let start = Instant::now();
        self.fire(&LintEvent::Starting);

        let inputs: Vec<PathBuf> = files
            .iter()
            .map(|file| file.canonicalize().unwrap_or_else(|_| file.clone()))
            .collect();
        let paths = if self.options.full_path {
            PathDisplay::full()
        } else {
            PathDisplay::new(&inputs, false)
        };

        let mut result = LintResult {
            paths: paths.clone(),
            ..Default::default()
        };
        for project in compute_projects(&inputs) {
            if self.cancel.is_canceled() {
                break;
            }
            result.projects.push(CheckedProject {
                name: project.name().to_string(),
                dir: project.dir().to_path_buf(),
            });
            let warnings = self.check_project(&project, scope, &paths, &mut result.files_checked);
            result.warnings.extend(warnings);
        }

        result.canceled = self.cancel.is_canceled();
        self.cancel.reset();
        result.finish();
        result.duration = start.elapsed();

        if result.canceled {
            log::info!("Lint run canceled after {} files", result.files_checked);
            self.fire(&LintEvent::Canceled);
        } else {
            log::info!(
                "Checked {} files in {:?}: {} errors, {} warnings",
                result.files_checked,
                result.duration,
                result.error_count,
                result.warning_count
            );
            self.fire(&LintEvent::Completed);
        }
        result
    }

    fn fire(&mut self, event: &LintEvent) {
        for listener in &mut self.listeners {
            listener.update(event);
        }
    }

    fn check_project(
        &mut self,
        project: &Project,
        scope: Option<ScopeSet>,
        paths: &PathDisplay,
        files_checked: &mut usize,
    ) -> Vec<Warning> {
        let scope = scope.unwrap_or_else(|| project.infer_scope());
        self.fire(&LintEvent::ScanningProject(project.name().to_string()));
        log::info!("Checking project {} ({})", project.name(), scope);

        let configuration = self.client.configuration(project);
        let mut detectors = self.registry.create_detectors(configuration.as_ref(), scope);
        log::debug!(
            "Running detectors: {}",
            detectors
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut collector = WarningCollector::new(
            self.registry.clone(),
            configuration,
            project,
            paths.clone(),
            self.options.show_lines,
        );

        {
            let mut ctx = Context::new(project, project.dir(), scope, &mut collector);
            for scoped in &mut detectors {
                scoped.detector.before_check_project(&mut ctx);
            }
        }

        if scope.contains(Scope::Manifest) && !self.cancel.is_canceled() {
            self.check_manifest(project, scope, &mut detectors, &mut collector, files_checked);
        }
        if (scope.contains(Scope::ResourceFile) || scope.contains(Scope::AllResourceFiles))
            && !self.cancel.is_canceled()
        {
            self.check_resources(project, scope, &mut detectors, &mut collector, files_checked);
        }
        if scope.contains(Scope::Proguard) && !self.cancel.is_canceled() {
            self.check_proguard(project, scope, &mut detectors, &mut collector, files_checked);
        }

        if !self.cancel.is_canceled() {
            let mut ctx = Context::new(project, project.dir(), scope, &mut collector);
            for scoped in &mut detectors {
                scoped.detector.after_check_project(&mut ctx);
            }
        }

        collector.into_warnings()
    }

    fn check_manifest(
        &mut self,
        project: &Project,
        scope: ScopeSet,
        detectors: &mut [ScopedDetector],
        collector: &mut WarningCollector,
        files_checked: &mut usize,
    ) {
        let manifest = project.manifest_file();
        if !project.includes(&manifest) || !manifest.is_file() {
            return;
        }
        let candidates = candidates(detectors, |s| s.contains(Scope::Manifest));
        let visitor = XmlVisitor::new(detectors, &candidates, None);
        self.check_xml_file(
            project,
            &manifest,
            scope,
            None,
            &visitor,
            detectors,
            collector,
            files_checked,
        );
    }

    fn check_resources(
        &mut self,
        project: &Project,
        scope: ScopeSet,
        detectors: &mut [ScopedDetector],
        collector: &mut WarningCollector,
        files_checked: &mut usize,
    ) {
        let candidates = candidates(detectors, |s| {
            s.contains(Scope::ResourceFile) || s.contains(Scope::AllResourceFiles)
        });
        if candidates.is_empty() {
            return;
        }

        let mut visitors: HashMap<ResourceFolderType, XmlVisitor> = HashMap::new();
        for (file, folder) in resource_files(project) {
            if self.cancel.is_canceled() {
                return;
            }
            let visitor = visitors
                .entry(folder)
                .or_insert_with(|| XmlVisitor::new(detectors, &candidates, Some(folder)));
            if visitor.is_empty() {
                continue;
            }
            self.check_xml_file(
                project,
                &file,
                scope,
                Some(folder),
                visitor,
                detectors,
                collector,
                files_checked,
            );
        }
    }

    fn check_proguard(
        &mut self,
        project: &Project,
        scope: ScopeSet,
        detectors: &mut [ScopedDetector],
        collector: &mut WarningCollector,
        files_checked: &mut usize,
    ) {
        let file = project.proguard_file();
        if !project.includes(&file) || !file.is_file() {
            return;
        }
        let candidates: Vec<usize> = candidates(detectors, |s| s.contains(Scope::Proguard))
            .into_iter()
            .filter(|&i| detectors[i].detector.applies_to_file(&file))
            .collect();
        if candidates.is_empty() {
            return;
        }

        let contents = match self.client.read_file(&file) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("Cannot read {}: {}", file.display(), err);
                return;
            }
        };
        self.fire(&LintEvent::ScanningFile(file.clone()));
        *files_checked += 1;
        collector.remember_source(&file, Arc::from(contents.as_str()));

        for i in candidates {
            if self.cancel.is_canceled() {
                return;
            }
            let mut ctx = Context::new(project, &file, scope, collector).with_contents(&contents);
            detectors[i].detector.run(&mut ctx);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_xml_file(
        &mut self,
        project: &Project,
        file: &Path,
        scope: ScopeSet,
        folder: Option<ResourceFolderType>,
        visitor: &XmlVisitor,
        detectors: &mut [ScopedDetector],
        collector: &mut WarningCollector,
        files_checked: &mut usize,
    ) {
        if self.cancel.is_canceled() {
            return;
        }
        let source: Arc<str> = match self.client.read_file(file) {
            Ok(source) => Arc::from(source),
            Err(err) => {
                log::warn!("Cannot read {}: {}", file.display(), err);
                return;
            }
        };

        self.fire(&LintEvent::ScanningFile(file.to_path_buf()));
        *files_checked += 1;
        if project.subset().is_some() {
            self.fire(&LintEvent::ClearMarkers {
                file: file.to_path_buf(),
                issues: visitor.issue_ids(detectors),
            });
        }

        collector.remember_source(file, source.clone());
        let document = match xml::parse(&*source) {
            Ok(document) => document,
            Err(err) => {
                log::debug!("{}: {}", file.display(), err);
                collector.report_parser_error(file, &err);
                return;
            }
        };

        let context = Context::new(project, file, scope, collector)
            .with_contents(&source)
            .with_folder_type(folder);
        let mut ctx = XmlContext::new(context, &document);
        visitor.visit_file(detectors, &mut ctx);
    }
}

/// Indices of the detectors whose scope passes `filter`
fn candidates(detectors: &[ScopedDetector], filter: impl Fn(ScopeSet) -> bool) -> Vec<usize> {
    detectors
        .iter()
        .enumerate()
        .filter(|(_, scoped)| filter(scoped.scope))
        .map(|(i, _)| i)
        .collect()
}

/// XML files to check in the project's resource folders, sorted by folder
/// then file name
fn resource_files(project: &Project) -> Vec<(PathBuf, ResourceFolderType)> {
    let folder_type = |file: &Path| {
        file.parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .and_then(ResourceFolderType::from_folder_name)
    };

    let files: Vec<PathBuf> = match project.subset() {
        Some(subset) => {
            let mut files: Vec<PathBuf> = subset
                .iter()
                .filter(|file| is_resource_file(file))
                .cloned()
                .collect();
            files.sort();
            files
        }
        None => WalkDir::new(project.resource_dir())
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| has_extension(name, "xml"))
            })
            .collect(),
    };

    files
        .into_iter()
        .filter_map(|file| folder_type(&file).map(|folder| (file, folder)))
        .collect()
}
