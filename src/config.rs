//! Severity configuration
//!
//! Severities are resolved in layers:
//! - the issue's compiled-in default
//! - persisted overrides (`~/.droidlintrc.yaml`, then the project's `lint.yaml`)
//! - command line `--enable` / `--disable` / `--check` lists
//!
//! Persisted overrides keep the historical string format (`Id=SEVERITY,...`
//! for severities, `Id,Id` for disabled issues) but are parsed once into
//! [`SeverityOverrides`] and cached until the backing string changes.

use crate::issue::{Issue, Severity};
use crate::registry::IssueRegistry;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Configuration file names looked up in project directories
pub const PROJECT_CONFIG_NAMES: [&str; 4] = [
    "lint.yaml",
    ".droidlintrc.yaml",
    ".droidlintrc.yml",
    ".droidlintrc.json",
];

/// Configuration file names looked up in the home directory
pub const GLOBAL_CONFIG_NAMES: [&str; 3] =
    [".droidlintrc.yaml", ".droidlintrc.yml", ".droidlintrc.json"];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid id or category \"{0}\"")]
    UnknownId(String),
}

/// Resolves the severity of an issue
pub trait Configuration: Send + Sync {
    fn severity(&self, issue: &Issue) -> Severity;

    fn is_enabled(&self, issue: &Issue) -> bool {
        self.severity(issue) != Severity::Ignore
    }
}

/// Compiled-in defaults only
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfiguration;

impl Configuration for DefaultConfiguration {
    fn severity(&self, issue: &Issue) -> Severity {
        if issue.is_enabled_by_default() {
            issue.default_severity()
        } else {
            Severity::Ignore
        }
    }
}

/// Typed form of the persisted severity and disabled-issue strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityOverrides {
    severities: BTreeMap<String, Severity>,
    disabled: BTreeSet<String>,
}

impl SeverityOverrides {
    /// Parses `Id=SEVERITY,Id=SEVERITY` and `Id,Id` strings
    ///
    /// Malformed entries are logged and skipped.
    pub fn parse(severities: &str, disabled: &str) -> Self {
        let mut overrides = Self::default();

        for entry in severities.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((id, name)) => match name.parse::<Severity>() {
                    Ok(severity) => {
                        overrides.severities.insert(id.trim().to_string(), severity);
                    }
                    Err(err) => log::warn!("Ignoring severity override {}: {}", entry, err),
                },
                None => log::warn!("Ignoring malformed severity override {}", entry),
            }
        }

        overrides.disabled = disabled
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        overrides
    }

    pub fn severity(&self, id: &str) -> Option<Severity> {
        if self.disabled.contains(id) {
            return Some(Severity::Ignore);
        }
        self.severities.get(id).copied()
    }

    pub fn set_severity(&mut self, id: &str, severity: Severity) {
        self.disabled.remove(id);
        self.severities.insert(id.to_string(), severity);
    }

    pub fn disable(&mut self, id: &str) {
        self.disabled.insert(id.to_string());
    }

    /// Serializes the severities back into `Id=SEVERITY,...` (sorted by id)
    pub fn severity_string(&self) -> String {
        self.severities
            .iter()
            .map(|(id, severity)| format!("{}={}", id, severity.name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Serializes the disabled ids back into `Id,Id` (sorted)
    pub fn disabled_string(&self) -> String {
        self.disabled.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

/// Configuration backed by persisted preference strings
///
/// Issues without an override fall through to the parent configuration, or
/// to the compiled-in defaults when there is none.
pub struct PersistedConfiguration {
    severity_source: String,
    disabled_source: String,
    parsed: OnceCell<SeverityOverrides>,
    parent: Option<Arc<dyn Configuration>>,
}

impl PersistedConfiguration {
    pub fn new(severities: impl Into<String>, disabled: impl Into<String>) -> Self {
        Self {
            severity_source: severities.into(),
            disabled_source: disabled.into(),
            parsed: OnceCell::new(),
            parent: None,
        }
    }

    pub fn from_config(config: &LintConfig) -> Self {
        Self::new(config.severity.clone(), config.disabled.clone())
    }

    pub fn with_parent(mut self, parent: Arc<dyn Configuration>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Parsed overrides, built on first use
    pub fn overrides(&self) -> &SeverityOverrides {
        self.parsed.get_or_init(|| {
            log::debug!(
                "Parsing severity overrides \"{}\" / disabled \"{}\"",
                self.severity_source,
                self.disabled_source
            );
            SeverityOverrides::parse(&self.severity_source, &self.disabled_source)
        })
    }

    /// Replaces the persisted severity string; the cache is only dropped
    /// when the string actually changes
    pub fn set_severity_string(&mut self, severities: &str) {
        if self.severity_source != severities {
            self.severity_source = severities.to_string();
            self.parsed = OnceCell::new();
        }
    }

    pub fn set_disabled_string(&mut self, disabled: &str) {
        if self.disabled_source != disabled {
            self.disabled_source = disabled.to_string();
            self.parsed = OnceCell::new();
        }
    }

    /// Overrides the severity of one issue and updates the backing strings
    pub fn set_severity(&mut self, id: &str, severity: Severity) {
        let mut overrides = self.overrides().clone();
        if severity == Severity::Ignore {
            overrides.disable(id);
        } else {
            overrides.set_severity(id, severity);
        }
        self.severity_source = overrides.severity_string();
        self.disabled_source = overrides.disabled_string();
        self.parsed = OnceCell::from(overrides);
    }

    pub fn severity_string(&self) -> &str {
        &self.severity_source
    }

    pub fn disabled_string(&self) -> &str {
        &self.disabled_source
    }
}

impl Configuration for PersistedConfiguration {
    fn severity(&self, issue: &Issue) -> Severity {
        if let Some(severity) = self.overrides().severity(issue.id()) {
            return severity;
        }
        match &self.parent {
            Some(parent) => parent.severity(issue),
            None => DefaultConfiguration.severity(issue),
        }
    }
}

/// Issue selections made on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintOptions {
    suppressed: HashSet<String>,
    enabled: HashSet<String>,
    check: Option<HashSet<String>>,
}

impl LintOptions {
    /// Builds the option sets from `--enable`, `--disable` and `--check`
    /// values, expanding category names into their issues
    pub fn from_flags(
        registry: &IssueRegistry,
        enable: &[String],
        disable: &[String],
        check: &[String],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            suppressed: expand_ids(registry, disable)?,
            enabled: expand_ids(registry, enable)?,
            check: if check.is_empty() {
                None
            } else {
                Some(expand_ids(registry, check)?)
            },
        })
    }

    pub fn suppressed(&self) -> &HashSet<String> {
        &self.suppressed
    }

    pub fn enabled(&self) -> &HashSet<String> {
        &self.enabled
    }

    pub fn check(&self) -> Option<&HashSet<String>> {
        self.check.as_ref()
    }
}

/// Expands issue ids and category names into a set of issue ids
///
/// A category name selects every issue whose category name or full category
/// name starts with it, so `Usability` also selects `Usability:Icons`.
pub fn expand_ids(
    registry: &IssueRegistry,
    tokens: &[String],
) -> Result<HashSet<String>, ConfigError> {
    let mut ids = HashSet::new();
    for token in tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if registry.is_issue_id(token) {
            ids.insert(token.to_string());
        } else if registry.is_category_name(token) {
            ids.extend(
                registry
                    .issues()
                    .iter()
                    .filter(|issue| issue.category().matches_prefix(token))
                    .map(|issue| issue.id().to_string()),
            );
        } else {
            return Err(ConfigError::UnknownId(token.to_string()));
        }
    }
    Ok(ids)
}

/// Command line selections layered on top of another configuration
pub struct CliConfiguration {
    parent: Arc<dyn Configuration>,
    options: Arc<LintOptions>,
}

impl CliConfiguration {
    pub fn new(parent: Arc<dyn Configuration>, options: Arc<LintOptions>) -> Self {
        Self { parent, options }
    }
}

impl Configuration for CliConfiguration {
    fn severity(&self, issue: &Issue) -> Severity {
        let id = issue.id();
        // Suppression wins over everything, including --check
        if self.options.suppressed.contains(id) {
            return Severity::Ignore;
        }

        let checked = self
            .options
            .check
            .as_ref()
            .map(|check| check.contains(id));
        let explicit = self.options.enabled.contains(id) || checked == Some(true);
        if checked == Some(false) && !explicit {
            return Severity::Ignore;
        }

        let severity = self.parent.severity(issue);
        if explicit && severity == Severity::Ignore {
            return match issue.default_severity() {
                Severity::Ignore => Severity::Warning,
                default => default,
            };
        }
        severity
    }
}

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Severity overrides, `Id=SEVERITY,...`
    pub severity: String,
    /// Disabled issues, `Id,Id`
    pub disabled: String,
}

impl LintConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every severity entry names a known severity
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in self.severity.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (_, name) = entry.split_once('=').ok_or_else(|| {
                ConfigError::Invalid(format!("expected Id=SEVERITY, found \"{}\"", entry))
            })?;
            name.parse::<Severity>().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// Finds the configuration file of a project directory, if any
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads the user-level configuration from the home directory
    pub fn load_global() -> Result<Option<Self>, ConfigError> {
        if let Some(home) = dirs::home_dir() {
            for name in &GLOBAL_CONFIG_NAMES {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path).map(Some);
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Category;
    use crate::scope::ScopeSet;
    use tempfile::TempDir;

    fn issue(id: &str, category: Category, severity: Severity) -> Issue {
        Issue::new(
            id,
            "summary",
            "explanation",
            category,
            5,
            severity,
            ScopeSet::RESOURCE_FILE_SCOPE,
        )
    }

    fn registry() -> IssueRegistry {
        IssueRegistry::builder()
            .issue(issue("A", Category::correctness(), Severity::Warning))
            .issue(issue("B", Category::correctness(), Severity::Warning))
            .issue(issue("Plain", Category::usability(), Severity::Warning))
            .issue(issue("Icon", Category::icons(), Severity::Warning))
            .issue(issue("Quiet", Category::performance(), Severity::Ignore))
            .build()
    }

    fn cli(
        registry: &IssueRegistry,
        enable: &[&str],
        disable: &[&str],
        check: &[&str],
    ) -> CliConfiguration {
        let to_vec = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let options =
            LintOptions::from_flags(registry, &to_vec(enable), &to_vec(disable), &to_vec(check))
                .unwrap();
        CliConfiguration::new(Arc::new(DefaultConfiguration), Arc::new(options))
    }

    fn severity_of(config: &dyn Configuration, registry: &IssueRegistry, id: &str) -> Severity {
        config.severity(registry.issue(id).unwrap())
    }

    #[test]
    fn test_parse_overrides() {
        let overrides = SeverityOverrides::parse("A=ERROR, B=ignore,Broken,C=LOUD", "Plain");
        assert_eq!(overrides.severity("A"), Some(Severity::Error));
        assert_eq!(overrides.severity("B"), Some(Severity::Ignore));
        assert_eq!(overrides.severity("C"), None);
        assert_eq!(overrides.severity("Plain"), Some(Severity::Ignore));
        assert_eq!(overrides.severity_string(), "A=ERROR,B=IGNORE");
        assert_eq!(overrides.disabled_string(), "Plain");
    }

    #[test]
    fn test_persisted_configuration_layers_over_defaults() {
        let registry = registry();
        let config = PersistedConfiguration::new("A=ERROR", "B");
        assert_eq!(severity_of(&config, &registry, "A"), Severity::Error);
        assert_eq!(severity_of(&config, &registry, "B"), Severity::Ignore);
        assert_eq!(severity_of(&config, &registry, "Plain"), Severity::Warning);
        assert_eq!(severity_of(&config, &registry, "Quiet"), Severity::Ignore);
    }

    #[test]
    fn test_project_configuration_overrides_parent() {
        let registry = registry();
        let global: Arc<dyn Configuration> =
            Arc::new(PersistedConfiguration::new("A=ERROR,B=ERROR", ""));
        let project = PersistedConfiguration::new("A=INFORMATIONAL", "").with_parent(global);
        assert_eq!(severity_of(&project, &registry, "A"), Severity::Informational);
        assert_eq!(severity_of(&project, &registry, "B"), Severity::Error);
    }

    #[test]
    fn test_cache_invalidated_only_on_change() {
        let registry = registry();
        let mut config = PersistedConfiguration::new("A=ERROR", "");
        assert_eq!(severity_of(&config, &registry, "A"), Severity::Error);

        config.set_severity_string("A=ERROR");
        assert!(config.parsed.get().is_some());

        config.set_severity_string("A=INFORMATIONAL");
        assert!(config.parsed.get().is_none());
        assert_eq!(severity_of(&config, &registry, "A"), Severity::Informational);
    }

    #[test]
    fn test_set_severity_updates_wire_format() {
        let mut config = PersistedConfiguration::new("B=ERROR", "");
        config.set_severity("A", Severity::Informational);
        config.set_severity("Plain", Severity::Ignore);
        assert_eq!(config.severity_string(), "A=INFORMATIONAL,B=ERROR");
        assert_eq!(config.disabled_string(), "Plain");
    }

    #[test]
    fn test_check_is_exclusive() {
        let registry = registry();
        let config = cli(&registry, &[], &[], &["A"]);
        assert_eq!(severity_of(&config, &registry, "A"), Severity::Warning);
        assert_eq!(severity_of(&config, &registry, "B"), Severity::Ignore);
        assert_eq!(severity_of(&config, &registry, "Plain"), Severity::Ignore);
    }

    #[test]
    fn test_check_with_enable_keeps_both() {
        let registry = registry();
        let config = cli(&registry, &["B"], &[], &["A"]);
        assert_eq!(severity_of(&config, &registry, "A"), Severity::Warning);
        assert_eq!(severity_of(&config, &registry, "B"), Severity::Warning);
    }

    #[test]
    fn test_disable_wins_over_check() {
        let registry = registry();
        let config = cli(&registry, &[], &["A"], &["A"]);
        assert_eq!(severity_of(&config, &registry, "A"), Severity::Ignore);
    }

    #[test]
    fn test_enable_lifts_ignored_default() {
        let registry = registry();
        let config = cli(&registry, &["Quiet"], &[], &[]);
        assert_eq!(severity_of(&config, &registry, "Quiet"), Severity::Warning);
    }

    #[test]
    fn test_category_expansion_is_prefix_based() {
        let registry = registry();
        let config = cli(&registry, &[], &["Usability"], &[]);
        assert_eq!(severity_of(&config, &registry, "Plain"), Severity::Ignore);
        assert_eq!(severity_of(&config, &registry, "Icon"), Severity::Ignore);

        let config = cli(&registry, &[], &["Usability:Icons"], &[]);
        assert_eq!(severity_of(&config, &registry, "Plain"), Severity::Warning);
        assert_eq!(severity_of(&config, &registry, "Icon"), Severity::Ignore);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let registry = registry();
        let result = LintOptions::from_flags(&registry, &["Nope".to_string()], &[], &[]);
        assert!(matches!(result, Err(ConfigError::UnknownId(id)) if id == "Nope"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let registry = registry();
        let options = Arc::new(
            LintOptions::from_flags(
                &registry,
                &["Quiet".to_string()],
                &["B".to_string()],
                &[],
            )
            .unwrap(),
        );
        let build = || {
            CliConfiguration::new(
                Arc::new(PersistedConfiguration::new("A=ERROR", "Plain")),
                options.clone(),
            )
        };
        let (first, second) = (build(), build());
        for issue in registry.issues() {
            assert_eq!(first.severity(issue), second.severity(issue));
            assert_eq!(first.severity(issue), first.severity(issue));
        }
    }

    #[test]
    fn test_load_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("lint.yaml");
        std::fs::write(&yaml, "severity: \"A=ERROR\"\ndisabled: \"B,Plain\"\n").unwrap();
        let config = LintConfig::load(&yaml).unwrap();
        assert_eq!(config.severity, "A=ERROR");
        assert_eq!(config.disabled, "B,Plain");
        assert_eq!(LintConfig::find_in(dir.path()), Some(yaml));

        let json = dir.path().join(".droidlintrc.json");
        std::fs::write(&json, r#"{"severity": "A=WARNING"}"#).unwrap();
        let config = LintConfig::load(&json).unwrap();
        assert_eq!(config.severity, "A=WARNING");
        assert_eq!(config.disabled, "");
    }

    #[test]
    fn test_load_rejects_bad_severity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lint.yaml");
        std::fs::write(&path, "severity: \"A=LOUD\"\n").unwrap();
        assert!(matches!(
            LintConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));

        let path = dir.path().join("lint.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            LintConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
