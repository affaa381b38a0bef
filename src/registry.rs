//! Issue registry
//!
//! An explicitly constructed, immutable table of every known issue and the
//! detectors that find them. Hosts that want a different implementation for
//! an issue swap it in with [`RegistryBuilder::substitute`] before the table
//! is frozen.

use crate::checks;
use crate::config::Configuration;
use crate::detector::Detector;
use crate::issue::{Category, Issue, Severity};
use crate::scope::ScopeSet;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Id of the synthetic issue used for files that fail to parse
pub const PARSER_ERROR: &str = "ParserError";

/// Creates a fresh detector instance
pub type DetectorFactory = Arc<dyn Fn() -> Box<dyn Detector> + Send + Sync>;

struct DetectorEntry {
    name: String,
    factory: DetectorFactory,
    issues: Vec<String>,
}

/// A detector instantiated for one project run
pub struct ScopedDetector {
    pub name: String,
    /// Union of the scopes of the issues this instance runs for
    pub scope: ScopeSet,
    /// Ids of the enabled issues this instance runs for
    pub issues: Vec<String>,
    pub detector: Box<dyn Detector>,
}

impl fmt::Debug for ScopedDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedDetector")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("issues", &self.issues)
            .finish()
    }
}

fn parser_error_issue() -> Issue {
    Issue::new(
        PARSER_ERROR,
        "Finds files that contain fatal parser errors",
        "Lint will ignore any files that contain fatal parsing errors. These may \
         contain other errors, or contain code which affects issues in other files.",
        Category::correctness(),
        10,
        Severity::Error,
        ScopeSet::RESOURCE_FILE_SCOPE.union(ScopeSet::MANIFEST_SCOPE),
    )
}

/// Builder for [`IssueRegistry`]
pub struct RegistryBuilder {
    issues: Vec<Issue>,
    detectors: Vec<DetectorEntry>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// A builder holding only the synthetic parser error issue
    pub fn new() -> Self {
        Self {
            issues: vec![parser_error_issue()],
            detectors: Vec::new(),
        }
    }

    /// Registers an issue with no detector behind it
    pub fn issue(mut self, issue: Issue) -> Self {
        self.add_issue(issue);
        self
    }

    /// Registers a detector together with the issues it reports
    pub fn detector<F>(mut self, name: &str, issues: Vec<Issue>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Detector> + Send + Sync + 'static,
    {
        let ids = issues
            .into_iter()
            .filter_map(|issue| {
                let id = issue.id().to_string();
                self.add_issue(issue).then_some(id)
            })
            .collect();
        self.detectors.push(DetectorEntry {
            name: name.to_string(),
            factory: Arc::new(factory),
            issues: ids,
        });
        self
    }

    /// Replaces the implementation behind `issue_id`
    ///
    /// Every issue served by the same detector switches to the new
    /// implementation as well.
    pub fn substitute<F>(mut self, issue_id: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Detector> + Send + Sync + 'static,
    {
        match self
            .detectors
            .iter_mut()
            .find(|entry| entry.issues.iter().any(|id| id == issue_id))
        {
            Some(entry) => {
                log::debug!("Substituting detector {} for {}", entry.name, issue_id);
                entry.factory = Arc::new(factory);
            }
            None => log::warn!("Cannot substitute detector: no detector reports {}", issue_id),
        }
        self
    }

    fn add_issue(&mut self, issue: Issue) -> bool {
        if self.issues.iter().any(|known| known.id() == issue.id()) {
            log::warn!("Duplicate issue id {} ignored", issue.id());
            return false;
        }
        self.issues.push(issue);
        true
    }

    pub fn build(self) -> IssueRegistry {
        let mut issues: Vec<Arc<Issue>> = self.issues.into_iter().map(Arc::new).collect();
        issues.sort_by(|a, b| {
            a.category()
                .full_name()
                .cmp(b.category().full_name())
                .then_with(|| b.priority().cmp(&a.priority()))
                .then_with(|| a.id().cmp(b.id()))
        });

        let index = issues
            .iter()
            .enumerate()
            .map(|(i, issue)| (issue.id().to_string(), i))
            .collect();

        IssueRegistry {
            issues,
            index,
            detectors: self.detectors,
        }
    }
}

/// Table of known issues and their detectors
pub struct IssueRegistry {
    issues: Vec<Arc<Issue>>,
    index: HashMap<String, usize>,
    detectors: Vec<DetectorEntry>,
}

impl IssueRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry with every built-in check
    pub fn builtin() -> Self {
        checks::register(RegistryBuilder::new()).build()
    }

    /// All issues, sorted by category, descending priority and id
    pub fn issues(&self) -> &[Arc<Issue>] {
        &self.issues
    }

    pub fn issue(&self, id: &str) -> Option<&Arc<Issue>> {
        self.index.get(id).map(|&i| &self.issues[i])
    }

    pub fn is_issue_id(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Whether `name` names a category or one of its parents
    pub fn is_category_name(&self, name: &str) -> bool {
        self.issues.iter().any(|issue| {
            let category = issue.category();
            category.full_name() == name
                || category.name() == name
                || category
                    .full_name()
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }

    /// Distinct categories in listing order
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = Vec::new();
        for issue in &self.issues {
            if !categories.contains(&issue.category()) {
                categories.push(issue.category());
            }
        }
        categories
    }

    /// Names of the registered detectors
    pub fn detector_names(&self) -> impl Iterator<Item = &str> {
        self.detectors.iter().map(|entry| entry.name.as_str())
    }

    /// Instantiates the detectors needed for a run over `scope`
    ///
    /// A detector is created when at least one of its issues is enabled and
    /// needs no more than the files `scope` covers.
    pub fn create_detectors(
        &self,
        configuration: &dyn Configuration,
        scope: ScopeSet,
    ) -> Vec<ScopedDetector> {
        self.detectors
            .iter()
            .filter_map(|entry| {
                let issues: Vec<&Arc<Issue>> = entry
                    .issues
                    .iter()
                    .filter_map(|id| self.issue(id))
                    .filter(|issue| issue.scope().is_subset(scope))
                    .filter(|issue| configuration.is_enabled(issue))
                    .collect();
                if issues.is_empty() {
                    return None;
                }
                let detector_scope = issues
                    .iter()
                    .fold(ScopeSet::empty(), |acc, issue| acc.union(issue.scope()));
                Some(ScopedDetector {
                    name: entry.name.clone(),
                    scope: detector_scope,
                    issues: issues.iter().map(|issue| issue.id().to_string()).collect(),
                    detector: (entry.factory)(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for IssueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueRegistry")
            .field("issues", &self.issues.len())
            .field("detectors", &self.detectors.len())
            .finish()
    }
}
