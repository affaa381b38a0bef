//! Resources that are declared but never referenced from XML

use crate::context::{Context, XmlContext};
use crate::detector::Detector;
use crate::issue::{Category, Issue, Severity};
use crate::location::Location;
use crate::scope::{ResourceFolderType, ScopeSet};
use crate::xml::{Document, Element};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

pub const UNUSED_RESOURCES: &str = "UnusedResources";

/// `@type/name` references, skipping framework resources
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\+?([a-z]+)/([A-Za-z0-9_.]+)").unwrap());

pub fn issue() -> Issue {
    Issue::new(
        UNUSED_RESOURCES,
        "Looks for unused resources",
        "Unused resources make applications larger and slow down builds. Only references \
         from XML resources and the manifest are considered, so resources used only from \
         code are reported too; enable this check explicitly when that is acceptable.",
        Category::performance(),
        3,
        Severity::Warning,
        ScopeSet::ALL_RESOURCES_SCOPE.union(ScopeSet::MANIFEST_SCOPE),
    )
    .with_enabled_by_default(false)
}

/// A resource key as it appears in `R`, e.g. `("string", "app_name")`
type ResourceKey = (String, String);

#[derive(Default)]
pub struct UnusedResourceDetector {
    declarations: BTreeMap<ResourceKey, Location>,
    references: HashSet<ResourceKey>,
}

impl UnusedResourceDetector {
    fn declare(&mut self, kind: &str, name: &str, location: Location) {
        self.declarations
            .entry((kind.to_string(), field_name(name)))
            .or_insert(location);
    }

    fn reference(&mut self, kind: &str, name: &str) {
        self.references.insert((kind.to_string(), field_name(name)));
    }

    fn scan_references(&mut self, value: &str) {
        for capture in REFERENCE.captures_iter(value) {
            let whole = capture.get(0).map_or("", |m| m.as_str());
            if whole.contains("android:") {
                continue;
            }
            self.reference(&capture[1], &capture[2]);
        }
    }

    fn visit_values(&mut self, ctx: &XmlContext<'_>, root: Element<'_>) {
        for element in root.child_elements() {
            let Some(name) = element.attribute("name") else {
                continue;
            };
            let kind = match element.tag_name() {
                "item" => match element.attribute("type") {
                    Some(kind) => kind,
                    None => continue,
                },
                "string-array" | "integer-array" => "array",
                "declare-styleable" | "eat-comment" | "skip" => continue,
                tag => tag,
            };
            self.declare(kind, name, ctx.element_location(element));

            if kind == "style" {
                match element.attribute("parent") {
                    Some(parent) if !parent.is_empty() => {
                        let parent = parent.trim_start_matches("@style/");
                        if !parent.starts_with('@') && !parent.starts_with("android:") {
                            self.reference("style", parent);
                        }
                    }
                    // implicit parent: Theme.Custom.Dark extends Theme.Custom
                    _ => {
                        if let Some((parent, _)) = name.rsplit_once('.') {
                            self.reference("style", parent);
                        }
                    }
                }
            }
        }
    }
}

impl Detector for UnusedResourceDetector {
    fn name(&self) -> &str {
        "UnusedResourceDetector"
    }

    fn before_check_project(&mut self, _ctx: &mut Context<'_>) {
        self.declarations.clear();
        self.references.clear();
    }

    fn visit_document(&mut self, ctx: &mut XmlContext<'_>, document: &Document) {
        match ctx.folder_type() {
            Some(ResourceFolderType::Values) => {
                if let Some(root) = document.root_element() {
                    self.visit_values(ctx, root);
                }
            }
            Some(folder) => {
                let name = ctx
                    .file()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.split('.').next())
                    .unwrap_or_default();
                if !name.is_empty() {
                    self.declare(folder.resource_type(), name, ctx.file_location());
                }
            }
            // the manifest only references
            None => {}
        }

        for element in document.elements() {
            for attribute in element.attributes() {
                self.scan_references(&attribute.value);
            }
        }
        for (_, text) in document.texts() {
            self.scan_references(text);
        }
    }

    fn after_check_project(&mut self, ctx: &mut Context<'_>) {
        let unused: Vec<(ResourceKey, Location)> = self
            .declarations
            .iter()
            .filter(|(key, _)| !self.references.contains(*key))
            .map(|(key, location)| (key.clone(), location.clone()))
            .collect();
        log::debug!(
            "{} resources declared, {} unused",
            self.declarations.len(),
            unused.len()
        );
        for ((kind, name), location) in unused {
            ctx.report(
                UNUSED_RESOURCES,
                location,
                format!("The resource R.{}.{} appears to be unused", kind, name),
            );
        }
    }
}

/// Name of the `R` field generated for a resource name
fn field_name(name: &str) -> String {
    name.replace('.', "_")
}
