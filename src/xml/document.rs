//! Owned DOM with source positions stored on every node

use super::PositionTracker;
use crate::location::{Location, Position};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Any `name="value"` or `name='value'` pair inside a tag
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s([^\s=/>]+)\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// An attribute of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name as written, e.g. `android:text`
    pub name: String,
    pub prefix: Option<String>,
    pub local_name: String,
    /// Namespace URI the prefix resolves to
    pub namespace: Option<String>,
    /// Unescaped value
    pub value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) attributes: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) start: Position,
    pub(crate) end: Option<Position>,
}

/// A parsed XML document
///
/// Nodes are stored in document order, so iterating over them visits
/// elements the same way a depth-first walk would.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl Document {
    pub(crate) fn from_parts(source: String, nodes: Vec<NodeData>, root: Option<NodeId>) -> Self {
        Self {
            source,
            nodes,
            root,
        }
    }

    /// The text the document was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root_element(&self) -> Option<Element<'_>> {
        self.root.map(|id| Element { doc: self, id })
    }

    pub fn element(&self, id: NodeId) -> Option<Element<'_>> {
        match self.nodes.get(id.0)?.kind {
            NodeKind::Element(_) => Some(Element { doc: self, id }),
            NodeKind::Text(_) => None,
        }
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        (0..self.nodes.len()).filter_map(move |i| self.element(NodeId(i)))
    }

    pub fn elements_by_tag_name<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = Element<'a>> + 'a {
        self.elements().filter(move |e| e.tag_name() == tag)
    }

    /// All text nodes with their parent element
    pub fn texts(&self) -> impl Iterator<Item = (Element<'_>, &str)> + '_ {
        self.nodes.iter().filter_map(move |node| match &node.kind {
            NodeKind::Text(text) => node
                .parent
                .and_then(|p| self.element(p))
                .map(|parent| (parent, text.as_str())),
            NodeKind::Element(_) => None,
        })
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn element_data(&self, id: NodeId) -> &ElementData {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => data,
            NodeKind::Text(_) => unreachable!("element handle pointing at a text node"),
        }
    }

    /// Finds the source range of attribute `name` on element `id`
    ///
    /// The range is located by searching the element's own span for
    /// `name="..."`; `None` when no match is found there.
    fn attribute_range(&self, id: NodeId, name: &str) -> Option<(Position, Position)> {
        let node = self.data(id);
        let start = node.start;
        let end = node.end?;
        let region = self.source.get(start.offset..end.offset)?;

        let captures = ATTRIBUTE
            .captures_iter(region)
            .find(|captures| captures.get(1).is_some_and(|m| m.as_str() == name))?;
        let name_match = captures.get(1)?;
        let whole = captures.get(0)?;

        let mut tracker = PositionTracker::starting_at(&self.source, start);
        let attr_start = tracker.position(start.offset + name_match.start());
        let attr_end = tracker.position(start.offset + whole.end());
        Some((attr_start, attr_end))
    }
}

/// A cheap handle to an element of a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct Element<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Element<'_> {}

impl<'d> Element<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    /// Qualified tag name as written
    pub fn tag_name(&self) -> &'d str {
        &self.doc.element_data(self.id).name
    }

    pub fn namespace(&self) -> Option<&'d str> {
        self.doc.element_data(self.id).namespace.as_deref()
    }

    pub fn attributes(&self) -> &'d [Attribute] {
        &self.doc.element_data(self.id).attributes
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        self.attributes()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute value by namespace URI and local name
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&'d str> {
        self.attributes()
            .iter()
            .find(|a| a.local_name == local_name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute_ns(&self, namespace: &str, local_name: &str) -> bool {
        self.attribute_ns(namespace, local_name).is_some()
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        self.doc
            .data(self.id)
            .parent
            .and_then(|p| self.doc.element(p))
    }

    pub fn is_root(&self) -> bool {
        self.doc.root == Some(self.id)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = Element<'d>> + 'd {
        let doc = self.doc;
        doc.data(self.id)
            .children
            .iter()
            .filter_map(move |child| doc.element(*child))
    }

    pub fn child_element_count(&self) -> usize {
        self.child_elements().count()
    }

    /// Concatenated content of the direct text children
    pub fn text(&self) -> String {
        self.doc
            .data(self.id)
            .children
            .iter()
            .filter_map(|child| match &self.doc.data(*child).kind {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Element(_) => None,
            })
            .collect()
    }

    /// Start of the element, at its `<`
    pub fn start(&self) -> Position {
        self.doc.data(self.id).start
    }

    /// End of the element, just past its closing tag
    pub fn end(&self) -> Option<Position> {
        self.doc.data(self.id).end
    }

    pub fn location(&self, file: &Path) -> Location {
        Location::new(file, self.start(), self.end())
    }

    /// Source range of an attribute, if it can be found in the element's span
    pub fn attribute_range(&self, name: &str) -> Option<(Position, Position)> {
        self.doc.attribute_range(self.id, name)
    }

    /// Location of an attribute, falling back to the element's location
    pub fn attribute_location(&self, file: &Path, name: &str) -> Location {
        match self.attribute_range(name) {
            Some((start, end)) => Location::new(file, start, Some(end)),
            None => self.location(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use std::path::Path;

    #[test]
    fn test_tree_navigation() {
        let document =
            parse("<menu><item id='a'><menu><item id='b'/></menu></item><item id='c'/></menu>")
                .unwrap();
        let root = document.root_element().unwrap();
        assert!(root.is_root());
        assert_eq!(root.child_element_count(), 2);

        let ids: Vec<_> = document
            .elements_by_tag_name("item")
            .filter_map(|e| e.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let nested = document
            .elements_by_tag_name("item")
            .nth(1)
            .unwrap();
        assert_eq!(nested.parent().unwrap().tag_name(), "menu");
        assert!(!nested.parent().unwrap().is_root());
    }

    #[test]
    fn test_attribute_location_falls_back_to_element() {
        let document = parse("<root>\n  <child name=\"x\"/>\n</root>").unwrap();
        let child = document.elements_by_tag_name("child").next().unwrap();
        let file = Path::new("res/values/test.xml");

        let missing = child.attribute_location(file, "other");
        assert_eq!(missing.start, Some(child.start()));

        let found = child.attribute_location(file, "name");
        assert_eq!(found.start.unwrap().line, 1);
        assert_eq!(found.start.unwrap().column, Some(9));
    }

    #[test]
    fn test_attribute_search_does_not_match_suffix() {
        let document = parse("<root android:id='a' id='b' xmlns:android='x'/>").unwrap();
        let root = document.root_element().unwrap();
        let (start, _) = root.attribute_range("id").unwrap();
        assert_eq!(start.offset, document.source().find(" id=").unwrap() + 1);
    }

    #[test]
    fn test_attribute_search_skips_quoted_values() {
        let document = parse("<root title=\"a b='c'\" b='d'/>").unwrap();
        let root = document.root_element().unwrap();
        let (start, end) = root.attribute_range("b").unwrap();
        assert_eq!(&document.source()[start.offset..end.offset], "b='d'");
    }

    #[test]
    fn test_texts_with_parents() {
        let document =
            parse("<resources><string name='a'>@string/b</string></resources>").unwrap();
        let texts: Vec<_> = document
            .texts()
            .map(|(parent, text)| (parent.tag_name().to_string(), text.to_string()))
            .collect();
        assert_eq!(
            texts,
            vec![("string".to_string(), "@string/b".to_string())]
        );
    }
}
