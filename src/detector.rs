//! The detector trait implemented by every check

use crate::context::{Context, XmlContext};
use crate::scope::ResourceFolderType;
use crate::xml::{Attribute, Document, Element};
use std::path::Path;

/// Which element or attribute names an XML detector wants to visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicable {
    /// Not interested in any
    Nothing,
    /// Every element (or attribute)
    All,
    /// Only these tag names (or attribute local names)
    Names(&'static [&'static str]),
}

/// A check that scans project files for one or more issues
///
/// XML detectors declare what they want to see through
/// [`applicable_elements`](Detector::applicable_elements) and
/// [`applicable_attributes`](Detector::applicable_attributes); detectors that
/// declare neither get the whole document through
/// [`visit_document`](Detector::visit_document). Other files (ProGuard
/// configuration) go through [`run`](Detector::run).
///
/// Detectors report through the context. Only enabled issues may be
/// reported; check [`Context::is_enabled`] first when a detector serves
/// several issues.
pub trait Detector {
    fn name(&self) -> &str;

    /// Whether resource files in `folder` should be visited
    fn applies_to_folder(&self, _folder: ResourceFolderType) -> bool {
        true
    }

    /// Whether a non-XML file should be passed to [`run`](Detector::run)
    fn applies_to_file(&self, _file: &Path) -> bool {
        true
    }

    fn applicable_elements(&self) -> Applicable {
        Applicable::Nothing
    }

    fn applicable_attributes(&self) -> Applicable {
        Applicable::Nothing
    }

    fn before_check_project(&mut self, _ctx: &mut Context<'_>) {}

    fn after_check_project(&mut self, _ctx: &mut Context<'_>) {}

    fn before_check_file(&mut self, _ctx: &mut Context<'_>) {}

    fn after_check_file(&mut self, _ctx: &mut Context<'_>) {}

    fn visit_document(&mut self, _ctx: &mut XmlContext<'_>, _document: &Document) {}

    fn visit_element(&mut self, _ctx: &mut XmlContext<'_>, _element: Element<'_>) {}

    /// Called after all children of `element` have been visited
    fn visit_element_after(&mut self, _ctx: &mut XmlContext<'_>, _element: Element<'_>) {}

    fn visit_attribute(
        &mut self,
        _ctx: &mut XmlContext<'_>,
        _element: Element<'_>,
        _attribute: &Attribute,
    ) {
    }

    /// Checks a non-XML file; the contents are available from the context
    fn run(&mut self, _ctx: &mut Context<'_>) {}
}
