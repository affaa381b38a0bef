//! Structure checks for `AndroidManifest.xml`

use crate::context::{Context, XmlContext};
use crate::detector::{Applicable, Detector};
use crate::issue::{Category, Issue, Severity};
use crate::location::Location;
use crate::scope::ScopeSet;
use crate::xml::{Element, ANDROID_URI};

pub const MANIFEST_ORDER: &str = "ManifestOrder";
pub const USES_SDK: &str = "UsesMinSdkAttributes";
pub const MULTIPLE_USES_SDK: &str = "MultipleUsesSdk";
pub const WRONG_PARENT: &str = "WrongManifestParent";

const TAG_APPLICATION: &str = "application";
const TAG_USES_SDK: &str = "uses-sdk";

/// Elements that belong inside `<application>`
const APPLICATION_CHILDREN: [&str; 5] =
    ["uses-library", "activity", "service", "provider", "receiver"];

pub fn order_issue() -> Issue {
    Issue::new(
        MANIFEST_ORDER,
        "Checks for manifest problems like <uses-sdk> after the <application> tag",
        "The <application> tag should appear after the elements which declare which \
         version you need, which features you need, which libraries you need, and so on. \
         In the past there have been subtle bugs (such as themes not getting applied \
         correctly) when the <application> tag appears before some of these other \
         elements, so it's best to order your manifest in the logical dependency order.",
        Category::correctness(),
        5,
        Severity::Warning,
        ScopeSet::MANIFEST_SCOPE,
    )
}

pub fn uses_sdk_issue() -> Issue {
    Issue::new(
        USES_SDK,
        "Checks that the minimum SDK attribute is specified",
        "The manifest should contain a <uses-sdk> element which defines the \
         minimum API Level required for the application to run.",
        Category::correctness(),
        2,
        Severity::Warning,
        ScopeSet::MANIFEST_SCOPE,
    )
    .with_more_info("http://developer.android.com/guide/topics/manifest/uses-sdk-element.html")
}

pub fn multiple_uses_sdk_issue() -> Issue {
    Issue::new(
        MULTIPLE_USES_SDK,
        "Checks that the <uses-sdk> element appears at most once",
        "The <uses-sdk> element should appear just once; the tools will *not* merge the \
         contents of all the elements so if you split up the attributes across multiple \
         elements, only one of them will take effect. To fix this, just merge all the \
         attributes from the various elements into a single <uses-sdk> element.",
        Category::correctness(),
        6,
        Severity::Error,
        ScopeSet::MANIFEST_SCOPE,
    )
    .with_more_info("http://developer.android.com/guide/topics/manifest/uses-sdk-element.html")
}

pub fn wrong_parent_issue() -> Issue {
    Issue::new(
        WRONG_PARENT,
        "Checks that various manifest elements are declared in the right place",
        "The <uses-library> element should be defined as a direct child of the \
         <application> tag, not the <manifest> tag or an <activity> tag. Similarly, a \
         <uses-sdk> tag much be declared at the root level, and so on. This check looks \
         for incorrect declaration locations in the manifest, and complains if an \
         element is found in the wrong place.",
        Category::correctness(),
        6,
        Severity::Error,
        ScopeSet::MANIFEST_SCOPE,
    )
    .with_more_info("http://developer.android.com/guide/topics/manifest/manifest-intro.html")
}

#[derive(Default)]
pub struct ManifestOrderDetector {
    seen_application: bool,
    uses_sdk_count: usize,
}

impl Detector for ManifestOrderDetector {
    fn name(&self) -> &str {
        "ManifestOrderDetector"
    }

    fn applicable_elements(&self) -> Applicable {
        Applicable::Names(&[
            "application",
            "uses-permission",
            "permission",
            "permission-tree",
            "permission-group",
            "uses-sdk",
            "uses-configuration",
            "uses-feature",
            "supports-screens",
            "compatible-screens",
            "supports-gl-texture",
            "uses-library",
            "activity",
            "service",
            "provider",
            "receiver",
        ])
    }

    fn before_check_file(&mut self, _ctx: &mut Context<'_>) {
        self.seen_application = false;
        self.uses_sdk_count = 0;
    }

    fn after_check_file(&mut self, ctx: &mut Context<'_>) {
        if self.uses_sdk_count == 0 && ctx.is_enabled(USES_SDK) {
            let location = ctx.file_location();
            ctx.report(
                USES_SDK,
                location,
                "Manifest should specify a minimum API level with \
                 <uses-sdk android:minSdkVersion=\"?\" />; if it really supports all \
                 versions of Android set it to 1.",
            );
        }
    }

    fn visit_element(&mut self, ctx: &mut XmlContext<'_>, element: Element<'_>) {
        let tag = element.tag_name();
        let parent = element.parent();

        if APPLICATION_CHILDREN.contains(&tag) {
            let under_application = parent.is_some_and(|p| p.tag_name() == TAG_APPLICATION);
            if !under_application && ctx.is_enabled(WRONG_PARENT) {
                let location = ctx.element_location(element);
                ctx.report(
                    WRONG_PARENT,
                    location,
                    format!(
                        "The <{}> element must be a direct child of the <application> element",
                        tag
                    ),
                );
            }
            return;
        }

        if !parent.is_some_and(|p| p.is_root()) {
            if ctx.is_enabled(WRONG_PARENT) {
                let location = ctx.element_location(element);
                ctx.report(
                    WRONG_PARENT,
                    location,
                    format!(
                        "The <{}> element must be a direct child of the <manifest> root element",
                        tag
                    ),
                );
            }
            return;
        }

        if tag == TAG_USES_SDK {
            self.uses_sdk_count += 1;
            if self.uses_sdk_count == 2 {
                if ctx.is_enabled(MULTIPLE_USES_SDK) {
                    report_multiple_uses_sdk(ctx, element);
                }
                return;
            }
            if !element.has_attribute_ns(ANDROID_URI, "minSdkVersion") && ctx.is_enabled(USES_SDK) {
                let location = ctx.element_location(element);
                ctx.report(
                    USES_SDK,
                    location,
                    "<uses-sdk> tag should specify a minimum API level with \
                     android:minSdkVersion=\"?\"",
                );
            }
        }

        if tag == TAG_APPLICATION {
            self.seen_application = true;
        } else if self.seen_application {
            if ctx.is_enabled(MANIFEST_ORDER) {
                let location = ctx.element_location(element);
                ctx.report(
                    MANIFEST_ORDER,
                    location,
                    format!("<{}> tag appears after <application> tag", tag),
                );
            }
            // one report per manifest
            self.seen_application = false;
        }
    }
}

fn report_multiple_uses_sdk(ctx: &mut XmlContext<'_>, element: Element<'_>) {
    let others: Vec<Location> = ctx
        .document()
        .elements_by_tag_name(TAG_USES_SDK)
        .filter(|other| *other != element)
        .map(|other| ctx.element_location(other).with_message("Also appears here"))
        .collect();
    let location = ctx.element_location(element).with_secondary(Location::chain(others));
    ctx.report(
        MULTIPLE_USES_SDK,
        location,
        "There should only be a single <uses-sdk> element in the manifest: merge these together",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{ids, lint_project, messages};
    use crate::scope::ANDROID_MANIFEST_XML;

    fn lint_manifest(body: &str) -> crate::driver::LintResult {
        let manifest = format!(
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"\n    package=\"test.pkg\">\n{}</manifest>\n",
            body
        );
        lint_project(
            &[(ANDROID_MANIFEST_XML, manifest.as_str())],
            &[MANIFEST_ORDER, USES_SDK, MULTIPLE_USES_SDK, WRONG_PARENT],
        )
    }

    #[test]
    fn test_well_formed_manifest() {
        let result = lint_manifest(
            "    <uses-sdk android:minSdkVersion=\"8\" />\n    <application>\n        <activity android:name=\".Main\" />\n    </application>\n",
        );
        assert!(result.warnings.is_empty(), "{:?}", messages(&result));
    }

    #[test]
    fn test_element_after_application() {
        let result = lint_manifest(
            "    <application />\n    <uses-sdk android:minSdkVersion=\"8\" />\n    <uses-permission android:name=\"x\" />\n",
        );
        assert_eq!(
            messages(&result),
            vec!["<uses-sdk> tag appears after <application> tag"]
        );
    }

    #[test]
    fn test_missing_min_sdk() {
        let result = lint_manifest("    <uses-sdk android:targetSdkVersion=\"14\" />\n");
        assert_eq!(ids(&result), vec![USES_SDK]);
        assert_eq!(result.warnings[0].line, Some(2));

        let result = lint_manifest("    <application />\n");
        assert_eq!(ids(&result), vec![USES_SDK]);
        assert_eq!(result.warnings[0].line, None);
    }

    #[test]
    fn test_multiple_uses_sdk() {
        let result = lint_manifest(
            "    <uses-sdk android:minSdkVersion=\"8\" />\n    <uses-sdk android:targetSdkVersion=\"14\" />\n",
        );
        assert_eq!(ids(&result), vec![MULTIPLE_USES_SDK]);
        let location = result.warnings[0].location.as_ref().unwrap();
        assert_eq!(location.line(), Some(3));
        let also: Vec<_> = location.secondaries().collect();
        assert_eq!(also.len(), 1);
        assert_eq!(also[0].line(), Some(2));
        assert_eq!(also[0].message.as_deref(), Some("Also appears here"));
    }

    #[test]
    fn test_wrong_parent() {
        let result = lint_manifest(
            "    <uses-sdk android:minSdkVersion=\"8\" />\n    <uses-library android:name=\"maps\" />\n    <application>\n        <uses-feature android:name=\"x\" />\n    </application>\n",
        );
        assert_eq!(
            messages(&result),
            vec![
                "The <uses-library> element must be a direct child of the <application> element",
                "The <uses-feature> element must be a direct child of the <manifest> root element",
            ]
        );
    }
}
