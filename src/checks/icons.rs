//! Bitmap coverage across density folders

use crate::context::Context;
use crate::detector::Detector;
use crate::issue::{Category, Issue, Severity};
use crate::location::Location;
use crate::scope::{has_extension, ScopeSet, RES_FOLDER};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const ICON_DENSITIES: &str = "IconDensities";
pub const ICON_MISSING_FOLDER: &str = "IconMissingDensityFolder";

const INCLUDE_LDPI_VAR: &str = "ANDROID_LINT_INCLUDE_LDPI";

/// Low density is rarely used, so it is only required on request
static INCLUDE_LDPI: Lazy<bool> = Lazy::new(|| {
    std::env::var(INCLUDE_LDPI_VAR).is_ok_and(|value| value.eq_ignore_ascii_case("true"))
});

const MORE_INFO: &str = "http://developer.android.com/guide/practices/screens_support.html";

pub fn densities_issue() -> Issue {
    Issue::new(
        ICON_DENSITIES,
        "Ensures that icons provide custom versions for all supported densities",
        "Icons will look best if a custom version is provided for each of the major screen \
         density classes (low, medium, high, extra high). This lint check identifies icons \
         which do not have complete coverage across the densities.\n\nLow density is not \
         really used much anymore, so this check ignores the ldpi density. To force lint \
         to include it, set the environment variable ANDROID_LINT_INCLUDE_LDPI=true.",
        Category::icons(),
        4,
        Severity::Warning,
        ScopeSet::ALL_RESOURCES_SCOPE,
    )
    .with_more_info(MORE_INFO)
}

pub fn missing_folder_issue() -> Issue {
    Issue::new(
        ICON_MISSING_FOLDER,
        "Ensures that all the density folders are present",
        "Icons will look best if a custom version is provided for each of the major screen \
         density classes (low, medium, high, extra high). This lint check identifies \
         folders which are missing, such as drawable-hdpi.\n\nLow density is not really \
         used much anymore, so this check ignores the ldpi density. To force lint to \
         include it, set the environment variable ANDROID_LINT_INCLUDE_LDPI=true.",
        Category::icons(),
        4,
        Severity::Warning,
        ScopeSet::ALL_RESOURCES_SCOPE,
    )
    .with_more_info(MORE_INFO)
}

fn required_densities() -> &'static [&'static str] {
    if *INCLUDE_LDPI {
        &["drawable-ldpi", "drawable-mdpi", "drawable-hdpi", "drawable-xhdpi"]
    } else {
        &["drawable-mdpi", "drawable-hdpi", "drawable-xhdpi"]
    }
}

fn is_density_folder(name: &str) -> bool {
    match name.strip_prefix("drawable-") {
        Some("nodpi" | "xhdpi" | "hdpi" | "mdpi") => true,
        Some("ldpi") => *INCLUDE_LDPI,
        _ => false,
    }
}

fn is_bitmap(name: &str) -> bool {
    ["png", "jpg", "jpeg", "gif"]
        .iter()
        .any(|ext| has_extension(name, ext))
}

/// Joins at most `max` items, summarizing the rest
fn format_list(items: &[String], max: usize) -> String {
    if items.len() <= max {
        return items.join(", ");
    }
    format!("{}... ({} more)", items[..max].join(", "), items.len() - max)
}

pub struct IconDetector;

impl IconDetector {
    /// Bitmap names per density folder, keyed by folder path
    fn collect(res: &Path) -> BTreeMap<PathBuf, BTreeSet<String>> {
        let mut folders = BTreeMap::new();
        for entry in WalkDir::new(res)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
        {
            let folder_name = entry.file_name().to_string_lossy();
            if !is_density_folder(&folder_name) {
                continue;
            }
            let names: BTreeSet<String> = WalkDir::new(entry.path())
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|file| file.file_type().is_file())
                .map(|file| file.file_name().to_string_lossy().into_owned())
                .filter(|name| is_bitmap(name))
                .collect();
            folders.insert(entry.path().to_path_buf(), names);
        }
        folders
    }

    fn check_missing_folders(
        ctx: &mut Context<'_>,
        res: &Path,
        folders: &BTreeMap<PathBuf, BTreeSet<String>>,
    ) {
        let defined: BTreeSet<String> = folders
            .keys()
            .filter_map(|folder| folder.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        let missing: Vec<String> = required_densities()
            .iter()
            .filter(|density| !defined.contains(**density))
            .map(|density| density.to_string())
            .collect();
        if missing.is_empty() {
            return;
        }
        ctx.report(
            ICON_MISSING_FOLDER,
            Location::file(res),
            format!(
                "Missing density variation folders in {}: {}",
                RES_FOLDER,
                format_list(&missing, missing.len())
            ),
        );
    }

    fn check_densities(ctx: &mut Context<'_>, folders: &BTreeMap<PathBuf, BTreeSet<String>>) {
        let scaled: Vec<(&PathBuf, &BTreeSet<String>)> = folders
            .iter()
            .filter(|(folder, _)| !folder.ends_with("drawable-nodpi"))
            .collect();
        let all_names: BTreeSet<&String> =
            scaled.iter().flat_map(|(_, names)| names.iter()).collect();

        for name in all_names {
            let (present, absent): (Vec<_>, Vec<_>) =
                scaled.iter().partition(|(_, names)| names.contains(name));
            if absent.is_empty() {
                continue;
            }
            let folder_names = |entries: &[&(&PathBuf, &BTreeSet<String>)]| -> Vec<String> {
                entries
                    .iter()
                    .filter_map(|(folder, _)| folder.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect()
            };
            let missing_in = folder_names(&absent);
            let found_in = folder_names(&present);

            let variants: Vec<Location> = present
                .iter()
                .map(|(folder, _)| Location::file(folder.join(name)))
                .collect();
            let Some(location) = Location::chain(variants) else {
                continue;
            };
            ctx.report(
                ICON_DENSITIES,
                location,
                format!(
                    "Missing the following drawables in {}: {} (found in {})",
                    format_list(&missing_in, 5),
                    name,
                    format_list(&found_in, 5)
                ),
            );
        }
    }
}

impl Detector for IconDetector {
    fn name(&self) -> &str {
        "IconDetector"
    }

    fn after_check_project(&mut self, ctx: &mut Context<'_>) {
        // density checks compare whole folders, which a file subset cannot show
        if ctx.project().subset().is_some() {
            return;
        }
        let res = ctx.project().resource_dir();
        if !res.is_dir() {
            return;
        }
        let folders = Self::collect(&res);
        if folders.is_empty() {
            return;
        }
        if ctx.is_enabled(ICON_MISSING_FOLDER) {
            Self::check_missing_folders(ctx, &res, &folders);
        }
        if ctx.is_enabled(ICON_DENSITIES) {
            Self::check_densities(ctx, &folders);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{ids, lint_project, messages};

    #[test]
    fn test_missing_density_variant() {
        let result = lint_project(
            &[
                ("res/drawable-mdpi/icon.png", "png"),
                ("res/drawable-hdpi/icon.png", "png"),
                ("res/drawable-xhdpi/icon.png", "png"),
                ("res/drawable-hdpi/logo.png", "png"),
                ("res/drawable-xhdpi/logo.png", "png"),
                ("res/drawable-nodpi/frame.png", "png"),
            ],
            &[ICON_DENSITIES, ICON_MISSING_FOLDER],
        );
        assert_eq!(
            messages(&result),
            vec!["Missing the following drawables in drawable-mdpi: logo.png (found in drawable-hdpi, drawable-xhdpi)"]
        );

        let location = result.warnings[0].location.as_ref().unwrap();
        let files: Vec<String> = location
            .iter()
            .map(|l| {
                let folder = l.file.parent().unwrap().file_name().unwrap();
                folder.to_string_lossy().into_owned()
            })
            .collect();
        assert_eq!(files, vec!["drawable-hdpi", "drawable-xhdpi"]);
    }

    #[test]
    fn test_missing_density_folder() {
        let result = lint_project(
            &[("res/drawable-mdpi/icon.png", "png")],
            &[ICON_DENSITIES, ICON_MISSING_FOLDER],
        );
        assert_eq!(ids(&result), vec![ICON_MISSING_FOLDER]);
        assert_eq!(
            result.warnings[0].message,
            "Missing density variation folders in res: drawable-hdpi, drawable-xhdpi"
        );
    }

    #[test]
    fn test_skipped_for_file_subset() {
        use crate::checks::testing::write_project;
        use crate::client::CliClient;
        use crate::config::LintOptions;
        use crate::driver::LintDriver;
        use crate::registry::IssueRegistry;
        use std::sync::Arc;

        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("app");
        write_project(
            &dir,
            &[
                ("res/drawable-mdpi/icon.png", "png"),
                ("res/layout/main.xml", "<LinearLayout/>\n"),
            ],
        );

        let registry = Arc::new(IssueRegistry::builtin());
        let check = vec![ICON_DENSITIES.to_string(), ICON_MISSING_FOLDER.to_string()];
        let options = LintOptions::from_flags(&registry, &[], &[], &check).unwrap();
        let mut driver = LintDriver::new(registry, Box::new(CliClient::new(Arc::new(options))));

        let layout = dir.join("res/layout/main.xml");
        let result = driver.analyze(&[layout], Some(ScopeSet::ALL_RESOURCES_SCOPE));
        assert!(result.warnings.is_empty());

        let result = driver.analyze(&[dir], Some(ScopeSet::ALL_RESOURCES_SCOPE));
        assert_eq!(ids(&result), vec![ICON_MISSING_FOLDER]);
    }

    #[test]
    fn test_format_list() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_list(&items, 5), "a, b, c");
        assert_eq!(format_list(&items, 2), "a, b... (1 more)");
    }
}
