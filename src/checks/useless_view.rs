//! Layouts that add nothing to the view hierarchy

use crate::context::XmlContext;
use crate::detector::{Applicable, Detector};
use crate::issue::{Category, Issue, Severity};
use crate::scope::{ResourceFolderType, ScopeSet};
use crate::xml::{Element, ANDROID_URI};

pub const USELESS_PARENT: &str = "UselessParent";
pub const USELESS_LEAF: &str = "UselessLeaf";

const CONTAINERS: &[&str] = &[
    "android.gesture.GestureOverlayView",
    "AbsoluteLayout",
    "FrameLayout",
    "GridLayout",
    "GridView",
    "HorizontalScrollView",
    "ImageSwitcher",
    "LinearLayout",
    "RadioGroup",
    "RelativeLayout",
    "ScrollView",
    "SlidingDrawer",
    "StackView",
    "TabHost",
    "TableLayout",
    "TableRow",
    "TextSwitcher",
    "ViewAnimator",
    "ViewFlipper",
    "ViewSwitcher",
];

pub fn parent_issue() -> Issue {
    Issue::new(
        USELESS_PARENT,
        "Checks whether a parent layout can be removed.",
        "A layout with children that has no siblings, is not a scrollview or a root \
         layout, and does not have a background, can be removed and have its children \
         moved directly into the parent for a flatter and more efficient layout hierarchy.",
        Category::performance(),
        2,
        Severity::Warning,
        ScopeSet::RESOURCE_FILE_SCOPE,
    )
}

pub fn leaf_issue() -> Issue {
    Issue::new(
        USELESS_LEAF,
        "Checks whether a leaf layout can be removed.",
        "A layout that has no children or no background can often be removed (since it \
         is invisible) for a flatter and more efficient layout hierarchy.",
        Category::performance(),
        2,
        Severity::Warning,
        ScopeSet::RESOURCE_FILE_SCOPE,
    )
}

pub struct UselessViewDetector;

impl Detector for UselessViewDetector {
    fn name(&self) -> &str {
        "UselessViewDetector"
    }

    fn applies_to_folder(&self, folder: ResourceFolderType) -> bool {
        folder == ResourceFolderType::Layout
    }

    fn applicable_elements(&self) -> Applicable {
        Applicable::Names(CONTAINERS)
    }

    fn visit_element(&mut self, ctx: &mut XmlContext<'_>, element: Element<'_>) {
        if element.child_element_count() == 0 {
            if ctx.is_enabled(USELESS_LEAF) {
                check_useless_leaf(ctx, element);
            }
        } else if ctx.is_enabled(USELESS_PARENT) {
            check_useless_parent(ctx, element);
        }
    }
}

fn check_useless_parent(ctx: &mut XmlContext<'_>, element: Element<'_>) {
    // the root cannot be removed
    let Some(parent) = element.parent() else {
        return;
    };
    let parent_tag = parent.tag_name();
    if matches!(parent_tag, "ScrollView" | "HorizontalScrollView" | "merge") {
        return;
    }
    if parent.child_element_count() != 1 {
        return;
    }

    let message = if element.has_attribute_ns(ANDROID_URI, "id") {
        format!(
            "This {} layout or its {} parent is possibly useless",
            element.tag_name(),
            parent_tag
        )
    } else {
        format!(
            "This {} layout or its {} parent is useless",
            element.tag_name(),
            parent_tag
        )
    };
    let location = ctx.element_location(element);
    ctx.report(USELESS_PARENT, location, message);
}

fn check_useless_leaf(ctx: &mut XmlContext<'_>, element: Element<'_>) {
    if element.has_attribute_ns(ANDROID_URI, "id")
        || element.has_attribute_ns(ANDROID_URI, "background")
    {
        return;
    }
    let location = ctx.element_location(element);
    ctx.report(
        USELESS_LEAF,
        location,
        format!(
            "This {} view is useless (no children, no background, no id)",
            element.tag_name()
        ),
    );
}
