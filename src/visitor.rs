//! Dispatches a parsed XML file to the detectors interested in it

use crate::context::XmlContext;
use crate::detector::Applicable;
use crate::registry::ScopedDetector;
use crate::scope::ResourceFolderType;
use crate::xml::Element;
use std::collections::HashMap;

/// Routing table from element and attribute names to detectors
///
/// Built once per resource folder type and reused for every file of that
/// type. Detectors are referred to by their index in the run's detector list.
#[derive(Debug, Default)]
pub(crate) struct XmlVisitor {
    all: Vec<usize>,
    documents: Vec<usize>,
    elements: HashMap<&'static str, Vec<usize>>,
    all_elements: Vec<usize>,
    attributes: HashMap<&'static str, Vec<usize>>,
    all_attributes: Vec<usize>,
}

impl XmlVisitor {
    /// Builds the table for `candidates`, keeping those that apply to `folder`
    ///
    /// `folder` is `None` for the manifest.
    pub(crate) fn new(
        detectors: &[ScopedDetector],
        candidates: &[usize],
        folder: Option<ResourceFolderType>,
    ) -> Self {
        let mut visitor = Self::default();
        for &index in candidates {
            let detector = &detectors[index].detector;
            if let Some(folder) = folder {
                if !detector.applies_to_folder(folder) {
                    continue;
                }
            }
            visitor.all.push(index);

            let elements = detector.applicable_elements();
            let attributes = detector.applicable_attributes();
            match elements {
                Applicable::All => visitor.all_elements.push(index),
                Applicable::Names(names) => {
                    for name in names {
                        visitor.elements.entry(*name).or_default().push(index);
                    }
                }
                Applicable::Nothing => {}
            }
            match attributes {
                Applicable::All => visitor.all_attributes.push(index),
                Applicable::Names(names) => {
                    for name in names {
                        visitor.attributes.entry(*name).or_default().push(index);
                    }
                }
                Applicable::Nothing => {}
            }
            if elements == Applicable::Nothing && attributes == Applicable::Nothing {
                visitor.documents.push(index);
            }
        }
        visitor
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Ids of the issues whose detectors run on files of this kind
    pub(crate) fn issue_ids(&self, detectors: &[ScopedDetector]) -> Vec<String> {
        self.all
            .iter()
            .flat_map(|&i| detectors[i].issues.iter().cloned())
            .collect()
    }

    fn walks_elements(&self) -> bool {
        !self.elements.is_empty()
            || !self.all_elements.is_empty()
            || !self.attributes.is_empty()
            || !self.all_attributes.is_empty()
    }

    pub(crate) fn visit_file(&self, detectors: &mut [ScopedDetector], ctx: &mut XmlContext<'_>) {
        for &i in &self.all {
            detectors[i].detector.before_check_file(ctx);
        }

        let document = ctx.document();
        for &i in &self.documents {
            detectors[i].detector.visit_document(ctx, document);
        }

        if self.walks_elements() {
            if let Some(root) = document.root_element() {
                self.visit_element(detectors, ctx, root);
            }
        }

        for &i in &self.all {
            detectors[i].detector.after_check_file(ctx);
        }
    }

    fn visit_element(
        &self,
        detectors: &mut [ScopedDetector],
        ctx: &mut XmlContext<'_>,
        element: Element<'_>,
    ) {
        let by_name = self.elements.get(element.tag_name());
        for &i in by_name.into_iter().flatten().chain(&self.all_elements) {
            detectors[i].detector.visit_element(ctx, element);
        }

        if !self.attributes.is_empty() || !self.all_attributes.is_empty() {
            for attribute in element.attributes() {
                let by_name = self.attributes.get(attribute.local_name.as_str());
                for &i in by_name.into_iter().flatten().chain(&self.all_attributes) {
                    detectors[i].detector.visit_attribute(ctx, element, attribute);
                }
            }
        }

        for child in element.child_elements() {
            self.visit_element(detectors, ctx, child);
        }

        for &i in by_name.into_iter().flatten().chain(&self.all_elements) {
            detectors[i].detector.visit_element_after(ctx, element);
        }
    }
}
