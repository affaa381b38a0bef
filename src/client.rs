//! The host seam between the driver and its environment

use crate::config::{
    CliConfiguration, Configuration, DefaultConfiguration, LintConfig, LintOptions,
    PersistedConfiguration,
};
use crate::project::Project;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Services the driver needs from whoever hosts it
pub trait LintClient {
    /// The configuration to use for `project`
    fn configuration(&mut self, project: &Project) -> Arc<dyn Configuration>;

    /// Reads a file to be checked
    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Client used by the command line
///
/// Each project gets its own configuration, layered as defaults, then the
/// global file, then the project's own file, then the command line flags.
pub struct CliClient {
    options: Arc<LintOptions>,
    global: Option<Arc<dyn Configuration>>,
    cache: HashMap<PathBuf, Arc<dyn Configuration>>,
}

impl CliClient {
    pub fn new(options: Arc<LintOptions>) -> Self {
        Self {
            options,
            global: None,
            cache: HashMap::new(),
        }
    }

    /// Uses `config` beneath every project configuration
    pub fn with_global(mut self, config: &LintConfig) -> Self {
        self.global = Some(Arc::new(PersistedConfiguration::from_config(config)));
        self.cache.clear();
        self
    }

    fn project_configuration(&self, project: &Project) -> Arc<dyn Configuration> {
        let parent: Arc<dyn Configuration> = match &self.global {
            Some(global) => global.clone(),
            None => Arc::new(DefaultConfiguration),
        };

        let Some(path) = LintConfig::find_in(project.dir()) else {
            return parent;
        };
        match LintConfig::load(&path) {
            Ok(config) => {
                log::debug!("Using configuration {}", path.display());
                Arc::new(PersistedConfiguration::from_config(&config).with_parent(parent))
            }
            Err(err) => {
                log::error!("Ignoring configuration {}: {}", path.display(), err);
                parent
            }
        }
    }
}

impl LintClient for CliClient {
    fn configuration(&mut self, project: &Project) -> Arc<dyn Configuration> {
        if let Some(configuration) = self.cache.get(project.dir()) {
            return configuration.clone();
        }
        let configuration: Arc<dyn Configuration> = Arc::new(CliConfiguration::new(
            self.project_configuration(project),
            self.options.clone(),
        ));
        self.cache
            .insert(project.dir().to_path_buf(), configuration.clone());
        configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Category, Issue, Severity};
    use crate::scope::ScopeSet;
    use std::fs;
    use tempfile::TempDir;

    fn issue(id: &str) -> Issue {
        Issue::new(
            id,
            "summary",
            "explanation",
            Category::correctness(),
            5,
            Severity::Warning,
            ScopeSet::RESOURCE_FILE_SCOPE,
        )
    }

    #[test]
    fn test_project_file_overrides_global() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("lint.yaml"),
            "severity: \"A=ERROR\"\ndisabled: \"C\"\n",
        )
        .unwrap();
        let project = Project::new(temp.path().to_path_buf());

        let global = LintConfig {
            severity: "A=INFORMATIONAL,B=ERROR".to_string(),
            disabled: String::new(),
        };
        let mut client = CliClient::new(Arc::new(LintOptions::default())).with_global(&global);
        let configuration = client.configuration(&project);

        assert_eq!(configuration.severity(&issue("A")), Severity::Error);
        assert_eq!(configuration.severity(&issue("B")), Severity::Error);
        assert_eq!(configuration.severity(&issue("C")), Severity::Ignore);
        assert_eq!(configuration.severity(&issue("D")), Severity::Warning);
    }

    #[test]
    fn test_broken_project_file_falls_back() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("lint.yaml"), "severity: \"A=LOUD\"\n").unwrap();
        let project = Project::new(temp.path().to_path_buf());

        let mut client = CliClient::new(Arc::new(LintOptions::default()));
        let configuration = client.configuration(&project);
        assert_eq!(configuration.severity(&issue("A")), Severity::Warning);
    }
}
