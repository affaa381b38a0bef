//! Obsolete ProGuard configuration

use crate::context::Context;
use crate::detector::Detector;
use crate::issue::{Category, Issue, Severity};
use crate::location::{Location, Position};
use crate::scope::{ScopeSet, PROGUARD_CFG};
use std::path::Path;

pub const PROGUARD: &str = "Proguard";

/// Flag combination written by old project templates
const OBSOLETE_KEEP: &str = "-keepclasseswithmembernames class * {\n    public <init>(android.";

pub fn issue() -> Issue {
    Issue::new(
        PROGUARD,
        "Looks for problems in proguard.cfg files",
        "Using -keepclasseswithmembernames in a proguard.cfg file is not correct; it can \
         cause some symbols to be renamed which should not be.\nEarlier versions of ADT \
         used to create proguard.cfg files with the wrong format. Instead of \
         -keepclasseswithmembernames use -keepclasseswithmembers, since the old flags \
         also implies \"allow shrinking\" which means symbols only referred to from XML \
         and not Java (such as possibly CustomViews) can get deleted.",
        Category::correctness(),
        8,
        Severity::Error,
        ScopeSet::PROGUARD_SCOPE,
    )
    .with_more_info("http://code.google.com/p/android/issues/detail?id=16384")
}

pub struct ProguardDetector;

impl Detector for ProguardDetector {
    fn name(&self) -> &str {
        "ProguardDetector"
    }

    fn applies_to_file(&self, file: &Path) -> bool {
        file.file_name().is_some_and(|name| name == PROGUARD_CFG)
    }

    fn run(&mut self, ctx: &mut Context<'_>) {
        let Some(contents) = ctx.contents() else {
            return;
        };
        let Some(index) = contents.find(OBSOLETE_KEEP) else {
            return;
        };

        let before = &contents[..index];
        let line = before.matches('\n').count();
        let column = before.rfind('\n').map_or(index, |nl| index - nl - 1);
        let location = Location::new(ctx.file(), Position::new(line, column, index), None);
        ctx.report(
            PROGUARD,
            location,
            "Obsolete proguard file; use -keepclasseswithmembers instead of \
             -keepclasseswithmembernames",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{lint_project, messages};

    #[test]
    fn test_obsolete_keep_flag() {
        let result = lint_project(
            &[(
                "proguard.cfg",
                "-optimizationpasses 5\n\n-keepclasseswithmembernames class * {\n    public <init>(android.content.Context, android.util.AttributeSet);\n}\n",
            )],
            &[PROGUARD],
        );
        assert_eq!(
            messages(&result),
            vec!["Obsolete proguard file; use -keepclasseswithmembers instead of -keepclasseswithmembernames"]
        );
        assert_eq!(result.warnings[0].line, Some(2));
        assert_eq!(result.warnings[0].column, Some(0));
    }

    #[test]
    fn test_current_keep_flag() {
        let result = lint_project(
            &[(
                "proguard.cfg",
                "-keepclasseswithmembers class * {\n    public <init>(android.content.Context);\n}\n",
            )],
            &[PROGUARD],
        );
        assert!(result.warnings.is_empty());
    }
}
