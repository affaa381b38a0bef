//! Duplicate `android:id` values within a layout

use crate::context::{Context, XmlContext};
use crate::detector::{Applicable, Detector};
use crate::issue::{Category, Issue, Severity};
use crate::location::Location;
use crate::scope::{ResourceFolderType, ScopeSet};
use crate::xml::{Attribute, Element, ANDROID_URI};
use std::collections::HashMap;

pub const DUPLICATE_IDS: &str = "DuplicateIds";

pub fn issue() -> Issue {
    Issue::new(
        DUPLICATE_IDS,
        "Checks for duplicate ids within a single layout",
        "Within a layout, id's should be unique since otherwise findViewById() can \
         return an unexpected view.",
        Category::layout(),
        7,
        Severity::Warning,
        ScopeSet::RESOURCE_FILE_SCOPE,
    )
}

/// Remembers the first location of every id seen in the current file
#[derive(Default)]
pub struct DuplicateIdDetector {
    seen: HashMap<String, Location>,
}

impl Detector for DuplicateIdDetector {
    fn name(&self) -> &str {
        "DuplicateIdDetector"
    }

    fn applies_to_folder(&self, folder: ResourceFolderType) -> bool {
        matches!(folder, ResourceFolderType::Layout | ResourceFolderType::Menu)
    }

    fn applicable_attributes(&self) -> Applicable {
        Applicable::Names(&["id"])
    }

    fn before_check_file(&mut self, _ctx: &mut Context<'_>) {
        self.seen.clear();
    }

    fn visit_attribute(
        &mut self,
        ctx: &mut XmlContext<'_>,
        element: Element<'_>,
        attribute: &Attribute,
    ) {
        if attribute.namespace.as_deref() != Some(ANDROID_URI) || attribute.value.is_empty() {
            return;
        }
        let id = attribute.value.as_str();
        let location = ctx.attribute_location(element, &attribute.name);

        match self.seen.get(id) {
            Some(first) => {
                let original = first
                    .clone()
                    .with_message(format!("{} originally defined here", id));
                ctx.report(
                    DUPLICATE_IDS,
                    location.with_secondary(Some(original)),
                    format!(
                        "Duplicate id {}, already defined earlier in this layout",
                        id
                    ),
                );
            }
            None => {
                self.seen.insert(id.to_string(), location);
            }
        }
    }
}
