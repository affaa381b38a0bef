//! Hardcoded text in layouts

use crate::context::XmlContext;
use crate::detector::{Applicable, Detector};
use crate::issue::{Category, Issue, Severity};
use crate::scope::{ResourceFolderType, ScopeSet};
use crate::xml::{Attribute, Element, ANDROID_URI};

pub const HARDCODED_TEXT: &str = "HardcodedText";

pub fn issue() -> Issue {
    Issue::new(
        HARDCODED_TEXT,
        "Looks for hardcoded text attributes which should be converted to resource lookup",
        "Hardcoding text attributes directly in layout files is bad for several reasons:\n\n\
         * When creating configuration variations (for example for landscape or portrait) \
         you have to repeat the actual text (and keep it up to date when making changes)\n\n\
         * The application cannot be translated to other languages by just adding new \
         translations for existing string resources.",
        Category::internationalization(),
        5,
        Severity::Warning,
        ScopeSet::RESOURCE_FILE_SCOPE,
    )
}

/// Flags `android:text` style attributes that are not resource references
pub struct HardcodedTextDetector;

impl Detector for HardcodedTextDetector {
    fn name(&self) -> &str {
        "HardcodedTextDetector"
    }

    fn applies_to_folder(&self, folder: ResourceFolderType) -> bool {
        folder == ResourceFolderType::Layout
    }

    fn applicable_attributes(&self) -> Applicable {
        Applicable::Names(&["text", "contentDescription", "hint", "label", "prompt"])
    }

    fn visit_attribute(
        &mut self,
        ctx: &mut XmlContext<'_>,
        element: Element<'_>,
        attribute: &Attribute,
    ) {
        let value = attribute.value.as_str();
        if value.is_empty() || value.starts_with('@') || value.starts_with('?') {
            return;
        }
        if attribute.namespace.as_deref() != Some(ANDROID_URI) {
            return;
        }

        let location = ctx.attribute_location(element, &attribute.name);
        ctx.report(
            HARDCODED_TEXT,
            location,
            format!(
                "[I18N] Hardcoded string \"{}\", should use @string resource",
                value
            ),
        );
    }
}
