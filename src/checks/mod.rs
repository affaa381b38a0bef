//! Built-in checks

pub mod duplicate_ids;
pub mod hardcoded;
pub mod icons;
pub mod manifest_order;
pub mod proguard;
pub mod px_usage;
pub mod unused_resources;
pub mod useless_view;

use crate::registry::RegistryBuilder;

/// Adds every built-in detector and its issues to `builder`
pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .detector("HardcodedTextDetector", vec![hardcoded::issue()], || {
            Box::new(hardcoded::HardcodedTextDetector)
        })
        .detector(
            "PxUsageDetector",
            vec![px_usage::px_issue(), px_usage::sp_issue()],
            || Box::new(px_usage::PxUsageDetector),
        )
        .detector("DuplicateIdDetector", vec![duplicate_ids::issue()], || {
            Box::<duplicate_ids::DuplicateIdDetector>::default()
        })
        .detector(
            "ManifestOrderDetector",
            vec![
                manifest_order::order_issue(),
                manifest_order::uses_sdk_issue(),
                manifest_order::multiple_uses_sdk_issue(),
                manifest_order::wrong_parent_issue(),
            ],
            || Box::<manifest_order::ManifestOrderDetector>::default(),
        )
        .detector(
            "UselessViewDetector",
            vec![useless_view::parent_issue(), useless_view::leaf_issue()],
            || Box::new(useless_view::UselessViewDetector),
        )
        .detector(
            "UnusedResourceDetector",
            vec![unused_resources::issue()],
            || Box::<unused_resources::UnusedResourceDetector>::default(),
        )
        .detector(
            "IconDetector",
            vec![icons::densities_issue(), icons::missing_folder_issue()],
            || Box::new(icons::IconDetector),
        )
        .detector("ProguardDetector", vec![proguard::issue()], || {
            Box::new(proguard::ProguardDetector)
        })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::CliClient;
    use crate::config::LintOptions;
    use crate::driver::{LintDriver, LintResult};
    use crate::registry::IssueRegistry;
    use crate::scope::ANDROID_MANIFEST_XML;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const EMPTY_MANIFEST: &str = "<manifest package=\"test.pkg\"/>\n";

    /// Writes `files` into a fresh project and lints it with only `checks`
    ///
    /// An empty `checks` runs every issue that is enabled by default.
    pub(crate) fn lint_project(files: &[(&str, &str)], checks: &[&str]) -> LintResult {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("app");
        write_project(&dir, files);

        let registry = Arc::new(IssueRegistry::builtin());
        let check: Vec<String> = checks.iter().map(|id| id.to_string()).collect();
        let options = LintOptions::from_flags(&registry, &[], &[], &check).unwrap();
        let client = CliClient::new(Arc::new(options));
        let mut driver = LintDriver::new(registry, Box::new(client));
        driver.analyze(&[dir], None)
    }

    pub(crate) fn write_project(dir: &Path, files: &[(&str, &str)]) {
        for (name, contents) in files {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let manifest = dir.join(ANDROID_MANIFEST_XML);
        if !manifest.exists() {
            fs::write(manifest, EMPTY_MANIFEST).unwrap();
        }
    }

    pub(crate) fn messages(result: &LintResult) -> Vec<&str> {
        result.warnings.iter().map(|w| w.message.as_str()).collect()
    }

    pub(crate) fn ids(result: &LintResult) -> Vec<&str> {
        result.warnings.iter().map(|w| w.issue.id()).collect()
    }
}
