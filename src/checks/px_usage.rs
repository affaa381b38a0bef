//! Pixel dimensions and dp text sizes

use crate::context::XmlContext;
use crate::detector::{Applicable, Detector};
use crate::issue::{Category, Issue, Severity};
use crate::scope::ScopeSet;
use crate::xml::{Attribute, Element};
use once_cell::sync::Lazy;
use regex::Regex;

pub const PX_USAGE: &str = "PxUsage";
pub const SP_USAGE: &str = "SpUsage";

static PX_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+px$").unwrap());
static DP_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+di?p$").unwrap());

pub fn px_issue() -> Issue {
    Issue::new(
        PX_USAGE,
        "Looks for use of the \"px\" dimension",
        "For performance reasons and to keep the code simpler, the Android system uses \
         pixels as the standard unit for expressing dimension or coordinate values. That \
         means that the dimensions of a view are always expressed in the code using pixels, \
         but always based on the current screen density. Use \"dp\" in layouts so that \
         views scale with the screen density.",
        Category::correctness(),
        2,
        Severity::Warning,
        ScopeSet::RESOURCE_FILE_SCOPE,
    )
    .with_more_info(
        "http://developer.android.com/guide/practices/screens_support.html#screen-independence",
    )
}

pub fn sp_issue() -> Issue {
    Issue::new(
        SP_USAGE,
        "Looks for uses of \"dp\" instead of \"sp\" dimensions for text sizes",
        "When setting text sizes, you should normally use \"sp\", or \"scale-independent \
         pixels\". This is like the dp unit, but it is also scaled by the user's font size \
         preference.\n\nThere *are* cases where you might need to use \"dp\"; typically \
         this happens when the text is in a container with a specific dp-size.",
        Category::correctness(),
        3,
        Severity::Warning,
        ScopeSet::RESOURCE_FILE_SCOPE,
    )
}

pub struct PxUsageDetector;

impl Detector for PxUsageDetector {
    fn name(&self) -> &str {
        "PxUsageDetector"
    }

    fn applicable_attributes(&self) -> Applicable {
        Applicable::All
    }

    fn visit_attribute(
        &mut self,
        ctx: &mut XmlContext<'_>,
        element: Element<'_>,
        attribute: &Attribute,
    ) {
        let value = attribute.value.as_str();
        if PX_VALUE.is_match(value) {
            // 0px is 0dp at every density
            if value.starts_with('0') || !ctx.is_enabled(PX_USAGE) {
                return;
            }
            let location = ctx.attribute_location(element, &attribute.name);
            ctx.report(
                PX_USAGE,
                location,
                "Avoid using \"px\" as units; use \"dp\" instead",
            );
        } else if attribute.local_name == "textSize"
            && DP_VALUE.is_match(value)
            && ctx.is_enabled(SP_USAGE)
        {
            let location = ctx.attribute_location(element, &attribute.name);
            ctx.report(
                SP_USAGE,
                location,
                "Should use \"sp\" instead of \"dp\" for text sizes",
            );
        }
    }
}
