//! Issue definitions: severities, categories and the issue record itself

use crate::scope::ScopeSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a reported issue
///
/// Ordered from least to most severe so that `max` picks the stronger one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Not reported at all
    Ignore,
    /// Informational message
    Informational,
    /// Warning - potential issue
    #[default]
    Warning,
    /// Error - definite problem, makes the run fatal
    Error,
}

impl Severity {
    /// Name used in persisted configuration strings (`Id=ERROR,...`)
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Ignore => "IGNORE",
            Severity::Informational => "INFORMATIONAL",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    /// Human readable description used in reports
    pub fn description(&self) -> &'static str {
        match self {
            Severity::Ignore => "Ignore",
            Severity::Informational => "Information",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Severity::Ignore),
            "informational" | "information" | "info" => Ok(Severity::Informational),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "fatal" => Ok(Severity::Error),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Hierarchical issue category, e.g. `Usability:Icons`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category {
    full_name: String,
    priority: u8,
}

impl Category {
    pub fn new(full_name: impl Into<String>, priority: u8) -> Self {
        Self {
            full_name: full_name.into(),
            priority,
        }
    }

    /// Creates a sub-category of `self`
    pub fn child(&self, name: &str, priority: u8) -> Self {
        Self::new(format!("{}:{}", self.full_name, name), priority)
    }

    pub fn correctness() -> Self {
        Self::new("Correctness", 10)
    }

    pub fn performance() -> Self {
        Self::new("Performance", 8)
    }

    pub fn usability() -> Self {
        Self::new("Usability", 6)
    }

    pub fn icons() -> Self {
        Self::usability().child("Icons", 7)
    }

    pub fn internationalization() -> Self {
        Self::new("Internationalization", 5)
    }

    pub fn layout() -> Self {
        Self::new("Layout", 4)
    }

    /// The last segment of the category name
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once(':')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }

    /// Full name including all parents, e.g. `Usability:Icons`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The parent category name, if any
    pub fn parent(&self) -> Option<&str> {
        self.full_name.rsplit_once(':').map(|(parent, _)| parent)
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Whether `prefix` selects this category (`Usability` selects `Usability:Icons`)
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.full_name.starts_with(prefix) || self.name().starts_with(prefix)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// An issue definition: one kind of problem a detector can find
///
/// Issues are created once when the registry is built and are never mutated
/// afterwards; everything else refers to them by id or through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    id: String,
    summary: String,
    explanation: String,
    category: Category,
    priority: u8,
    severity: Severity,
    more_info: Option<String>,
    enabled_by_default: bool,
    scope: ScopeSet,
}

impl Issue {
    pub fn new(
        id: impl Into<String>,
        summary: impl Into<String>,
        explanation: impl Into<String>,
        category: Category,
        priority: u8,
        severity: Severity,
        scope: ScopeSet,
    ) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            explanation: explanation.into(),
            category,
            priority: priority.clamp(1, 10),
            severity,
            more_info: None,
            enabled_by_default: true,
            scope,
        }
    }

    pub fn with_more_info(mut self, url: impl Into<String>) -> Self {
        self.more_info = Some(url.into());
        self
    }

    pub fn with_enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// One line description
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Priority from 1 (lowest) to 10 (highest)
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Compiled-in default severity
    pub fn default_severity(&self) -> Severity {
        self.severity
    }

    pub fn more_info(&self) -> Option<&str> {
        self.more_info.as_deref()
    }

    pub fn is_enabled_by_default(&self) -> bool {
        self.enabled_by_default
    }

    /// The set of files the issue needs to see to be detected
    pub fn scope(&self) -> ScopeSet {
        self.scope
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Informational);
        assert!(Severity::Informational > Severity::Ignore);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("INFORMATIONAL".parse::<Severity>(), Ok(Severity::Informational));
        assert_eq!("Ignore".parse::<Severity>(), Ok(Severity::Ignore));
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_names_round_trip() {
        for severity in [
            Severity::Ignore,
            Severity::Informational,
            Severity::Warning,
            Severity::Error,
        ] {
            assert_eq!(severity.name().parse::<Severity>(), Ok(severity));
        }
    }

    #[test]
    fn test_category_names() {
        let icons = Category::icons();
        assert_eq!(icons.full_name(), "Usability:Icons");
        assert_eq!(icons.name(), "Icons");
        assert_eq!(icons.parent(), Some("Usability"));
        assert_eq!(Category::correctness().parent(), None);
    }

    #[test]
    fn test_category_prefix_matching() {
        let icons = Category::icons();
        assert!(icons.matches_prefix("Usability"));
        assert!(icons.matches_prefix("Usability:Icons"));
        assert!(icons.matches_prefix("Icons"));
        assert!(!Category::usability().matches_prefix("Usability:Icons"));
    }

    #[test]
    fn test_issue_priority_clamped() {
        let issue = Issue::new(
            "Loud",
            "summary",
            "explanation",
            Category::correctness(),
            42,
            Severity::Warning,
            ScopeSet::RESOURCE_FILE_SCOPE,
        );
        assert_eq!(issue.priority(), 10);
        assert!(issue.is_enabled_by_default());
        assert_eq!(issue.more_info(), None);
    }
}
