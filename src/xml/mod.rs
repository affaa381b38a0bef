//! Position-tracking XML parser
//!
//! Builds an owned DOM ([`Document`]) where every element knows the exact
//! range it occupies in the source text. Parsing is driven by quick-xml; the
//! reader only hands out byte offsets, so line and column numbers are
//! reconstructed with a monotonic [`PositionTracker`] cursor.

mod document;

pub use document::{Attribute, Document, Element, NodeId};

use crate::location::Position;
use document::{ElementData, NodeData, NodeKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Namespace of the Android attributes
pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";
/// Namespace of the `tools:` attributes
pub const TOOLS_URI: &str = "http://schemas.android.com/tools";
const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Errors raised while parsing an XML document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("XML parse error at line {}: {message}", .position.line + 1)]
    Xml { position: Position, message: String },

    /// Non-markup content before the root element, typically a byte order mark
    #[error("Content is not allowed in prolog")]
    Prolog { position: Position },

    #[error("XML document structures must start and end within the same entity")]
    UnexpectedEof { position: Position },
}

impl ParseError {
    /// Where in the source the error was detected
    pub fn position(&self) -> Position {
        match self {
            ParseError::Xml { position, .. }
            | ParseError::Prolog { position }
            | ParseError::UnexpectedEof { position } => *position,
        }
    }
}

/// Parses `source` into a position-annotated [`Document`]
///
/// When the document has junk in front of the root element (a byte order
/// mark, for instance) the parse is retried once with everything up to the
/// first `<` skipped. Positions always index the original text.
pub fn parse(source: impl Into<String>) -> Result<Document, ParseError> {
    let source = source.into();
    let tree = match build_tree(&source, 0) {
        Err(err @ ParseError::Prolog { .. }) => {
            let skip = match source.find('<') {
                Some(index) if index > 0 => index,
                _ => return Err(err),
            };
            log::debug!("Retrying XML parse without {} leading bytes", skip);
            build_tree(&source, skip)?
        }
        other => other?,
    };
    Ok(Document::from_parts(source, tree.nodes, tree.root))
}

struct Tree {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

fn build_tree(source: &str, skip: usize) -> Result<Tree, ParseError> {
    let input = &source[skip..];
    let mut builder = TreeBuilder::new(source);

    let trimmed = input.trim_start();
    if !trimmed.is_empty() && !trimmed.starts_with('<') {
        let leading = input.len() - trimmed.len();
        return Err(ParseError::Prolog {
            position: builder.tracker.position(skip + leading),
        });
    }

    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = true;

    loop {
        let before = skip + reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let at = skip + reader.error_position() as usize;
                return Err(builder.error_at(at, err.to_string()));
            }
        };
        let after = skip + reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                builder.flush_text();
                builder.open_element(&e, after)?;
            }
            Event::Empty(e) => {
                builder.flush_text();
                builder.open_element(&e, after)?;
                builder.close_element(after)?;
            }
            Event::End(_) => {
                builder.flush_text();
                builder.close_element(after)?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| builder.error_at(before, err.to_string()))?;
                builder.push_text(before, after, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.push_text(before, after, &text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry no positions we care about.
            _ => {}
        }
    }

    builder.finish()
}

struct PendingText {
    start: usize,
    end: usize,
    content: String,
}

struct TreeBuilder<'s> {
    source: &'s str,
    tracker: PositionTracker<'s>,
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    namespaces: Vec<Vec<(String, String)>>,
    root: Option<NodeId>,
    text: Option<PendingText>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            tracker: PositionTracker::new(source),
            nodes: Vec::new(),
            stack: Vec::new(),
            namespaces: Vec::new(),
            root: None,
            text: None,
        }
    }

    fn error_at(&mut self, offset: usize, message: String) -> ParseError {
        let offset = offset.min(self.source.len());
        ParseError::Xml {
            position: self.tracker.position(offset),
            message,
        }
    }

    /// Opens an element whose start tag ends at `tag_end`
    fn open_element(&mut self, e: &BytesStart<'_>, tag_end: usize) -> Result<(), ParseError> {
        // quick-xml reports the position after the start tag; `<` cannot
        // occur inside a tag so the nearest one before it starts the element.
        let start_offset = self.source[..tag_end].rfind('<').unwrap_or(tag_end);

        if self.stack.is_empty() && self.root.is_some() {
            return Err(self.error_at(
                start_offset,
                "The markup in the document following the root element must be well-formed"
                    .to_string(),
            ));
        }

        let start = self.tracker.position(start_offset);
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let mut raw = Vec::new();
        let mut declared = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error_at(start_offset, err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| self.error_at(start_offset, err.to_string()))?
                .into_owned();
            if key == "xmlns" {
                declared.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declared.push((prefix.to_string(), value.clone()));
            }
            raw.push((key, value));
        }
        self.namespaces.push(declared);

        let attributes = raw
            .into_iter()
            .map(|(name, value)| {
                let (prefix, local_name) = split_name(&name);
                let namespace = prefix.and_then(|p| self.resolve(p));
                Attribute {
                    prefix: prefix.map(String::from),
                    local_name: local_name.to_string(),
                    namespace,
                    name,
                    value,
                }
            })
            .collect();
        let namespace = self.resolve(split_name(&name).0.unwrap_or(""));

        let id = self.push_node(
            NodeKind::Element(ElementData {
                name,
                namespace,
                attributes,
            }),
            start,
        );
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.stack.push(id);
        Ok(())
    }

    fn close_element(&mut self, end_offset: usize) -> Result<(), ParseError> {
        let Some(id) = self.stack.pop() else {
            return Err(self.error_at(end_offset, "Unexpected end tag".to_string()));
        };
        self.namespaces.pop();
        let end = self.tracker.position(end_offset);
        self.nodes[id.0].end = Some(end);
        Ok(())
    }

    fn push_text(&mut self, start: usize, end: usize, text: &str) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            let leading = text.len() - text.trim_start().len();
            return Err(if self.root.is_none() {
                ParseError::Prolog {
                    position: self.tracker.position(start + leading),
                }
            } else {
                self.error_at(
                    start + leading,
                    "Content is not allowed in trailing section".to_string(),
                )
            });
        }

        match &mut self.text {
            Some(pending) => {
                pending.content.push_str(text);
                pending.end = end;
            }
            None => {
                self.text = Some(PendingText {
                    start,
                    end,
                    content: text.to_string(),
                })
            }
        }
        Ok(())
    }

    fn flush_text(&mut self) {
        if let Some(pending) = self.text.take() {
            let start = self.tracker.position(pending.start);
            let end = self.tracker.position(pending.end);
            let id = self.push_node(NodeKind::Text(pending.content), start);
            self.nodes[id.0].end = Some(end);
        }
    }

    fn push_node(&mut self, kind: NodeKind, start: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            start,
            end: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_URI.to_string());
        }
        self.namespaces
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(declared, _)| declared == prefix)
            .map(|(_, uri)| uri.clone())
    }

    fn finish(mut self) -> Result<Tree, ParseError> {
        self.flush_text();
        if !self.stack.is_empty() {
            return Err(ParseError::UnexpectedEof {
                position: self.tracker.position(self.source.len()),
            });
        }
        if self.root.is_none() {
            return Err(ParseError::UnexpectedEof {
                position: self.tracker.position(self.source.len()),
            });
        }
        Ok(Tree {
            nodes: self.nodes,
            root: self.root,
        })
    }
}

fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Converts byte offsets into line/column positions
///
/// The cursor only moves forward; asking for an offset behind it restarts the
/// scan from the beginning of the text. Lines end at `\n`, `\r\n` or a lone
/// `\r`.
pub(crate) struct PositionTracker<'s> {
    text: &'s str,
    offset: usize,
    line: usize,
    line_start: usize,
}

impl<'s> PositionTracker<'s> {
    pub(crate) fn new(text: &'s str) -> Self {
        Self {
            text,
            offset: 0,
            line: 0,
            line_start: 0,
        }
    }

    /// A tracker whose cursor already sits at a known position
    pub(crate) fn starting_at(text: &'s str, position: Position) -> Self {
        let offset = position.offset.min(text.len());
        let line_start = text.as_bytes()[..offset]
            .iter()
            .rposition(|b| *b == b'\n' || *b == b'\r')
            .map(|i| i + 1)
            .unwrap_or(0);
        Self {
            text,
            offset,
            line: position.line,
            line_start,
        }
    }

    pub(crate) fn position(&mut self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        if offset < self.offset {
            self.offset = 0;
            self.line = 0;
            self.line_start = 0;
        }

        let bytes = self.text.as_bytes();
        for i in self.offset..offset {
            match bytes[i] {
                b'\n' => {
                    self.line += 1;
                    self.line_start = i + 1;
                }
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => {
                    self.line += 1;
                    self.line_start = i + 1;
                }
                _ => {}
            }
        }
        self.offset = offset;

        let column = self
            .text
            .get(self.line_start..offset)
            .map(|prefix| prefix.chars().count());
        Position {
            line: self.line,
            column,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LAYOUT: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
        <LinearLayout xmlns:android=\"http://schemas.android.com/apk/res/android\"\n\
        \x20   android:layout_width=\"match_parent\"\n\
        \x20   android:layout_height=\"wrap_content\"\n\
        \x20   android:orientation=\"vertical\" >\n\
        \n\
        <Button\n\
        \x20   android:id=\"@+id/button1\"\n\
        \x20   android:layout_width=\"wrap_content\"\n\
        \x20   android:layout_height=\"wrap_content\"\n\
        \x20   android:text=\"Button\" />\n\
        \n\
        <Button\n\
        \x20   android:id=\"@+id/button2\"\n\
        \x20   android:layout_width=\"wrap_content\"\n\
        \x20   android:layout_height=\"wrap_content\"\n\
        \x20   android:text=\"Button\" />\n\
        \n\
        </LinearLayout>\n";

    fn check_layout_positions(xml: &str) {
        let document = parse(xml.to_string()).unwrap();
        let root = document.root_element().unwrap();
        assert_eq!(root.tag_name(), "LinearLayout");

        let attr_start = xml.find("android:layout_width").unwrap();
        let attr_end = attr_start + "android:layout_width=\"match_parent\"".len();
        let (start, end) = root.attribute_range("android:layout_width").unwrap();
        assert_eq!(start.offset, attr_start);
        assert_eq!(end.offset, attr_end);
        assert_eq!(start.line, 2);
        assert_eq!(start.column, Some(4));

        let button = root.child_elements().next().unwrap();
        assert_eq!(button.tag_name(), "Button");
        let button_start = xml.find("<Button").unwrap();
        let button_end = xml.find("/>").unwrap() + 2;
        assert_eq!(button.start().offset, button_start);
        assert_eq!(button.end().unwrap().offset, button_end);
        assert_eq!(button.start().line, 6);
        assert_eq!(button.start().column, Some(0));
        assert_eq!(button.end().unwrap().line, 10);
    }

    #[test]
    fn test_element_and_attribute_positions() {
        check_layout_positions(LAYOUT);
    }

    #[test]
    fn test_positions_with_crlf_line_endings() {
        let xml = LAYOUT.replace('\n', "\r\n");
        check_layout_positions(&xml);
    }

    #[test]
    fn test_positions_after_byte_order_mark() {
        let xml = format!("\u{feff}{}", LAYOUT);
        let document = parse(xml.clone()).unwrap();
        let root = document.root_element().unwrap();
        let button = root.child_elements().next().unwrap();
        assert_eq!(button.start().offset, xml.find("<Button").unwrap());
        assert_eq!(button.end().unwrap().offset, xml.find("/>").unwrap() + 2);
        let (start, end) = root.attribute_range("android:layout_width").unwrap();
        let expected = xml.find("android:layout_width").unwrap();
        assert_eq!(start.offset, expected);
        assert_eq!(
            end.offset,
            expected + "android:layout_width=\"match_parent\"".len()
        );
    }

    #[test]
    fn test_simple_element_round_trip() {
        let xml = "<root>\n  <foo bar=\"baz\"/>\n</root>";
        let document = parse(xml).unwrap();
        let foo = document.elements_by_tag_name("foo").next().unwrap();
        assert_eq!(foo.start().offset, xml.find("<foo").unwrap());
        assert_eq!(foo.end().unwrap().offset, xml.find("/>").unwrap() + 2);
        assert_eq!(foo.start().line, 1);
        assert_eq!(foo.start().column, Some(2));

        let (start, end) = foo.attribute_range("bar").unwrap();
        assert_eq!(start.offset, xml.find("bar").unwrap());
        assert_eq!(end.offset, xml.find("baz").unwrap() + 4);
        assert_eq!(start.column, Some(7));
    }

    #[test]
    fn test_junk_prefix_is_skipped_once() {
        let xml = "junk<root a='1'/>";
        let document = parse(xml).unwrap();
        let root = document.root_element().unwrap();
        assert_eq!(root.start().offset, 4);
        assert_eq!(root.attribute("a"), Some("1"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse("<root><child></root>"),
            Err(ParseError::Xml { .. })
        ));
        assert!(matches!(
            parse("<root><child>"),
            Err(ParseError::UnexpectedEof { .. })
        ));
        assert!(matches!(parse("<a/><b/>"), Err(ParseError::Xml { .. })));
        assert!(matches!(parse(""), Err(ParseError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse("<root>\n<child>\n</root>").unwrap_err();
        assert!(err.position().line >= 1);
        assert!(err.to_string().starts_with("XML parse error at line"));
    }

    #[test]
    fn test_namespaces_resolved() {
        let document = parse(LAYOUT).unwrap();
        let root = document.root_element().unwrap();
        assert_eq!(
            root.attribute_ns(ANDROID_URI, "orientation"),
            Some("vertical")
        );
        let attr = root
            .attributes()
            .iter()
            .find(|a| a.local_name == "layout_height")
            .unwrap();
        assert_eq!(attr.prefix.as_deref(), Some("android"));
        assert_eq!(attr.namespace.as_deref(), Some(ANDROID_URI));
    }

    #[test]
    fn test_text_is_unescaped_and_merged() {
        let document = parse("<string name=\"a\">Tom &amp; <![CDATA[Jerry]]></string>").unwrap();
        let root = document.root_element().unwrap();
        assert_eq!(root.text(), "Tom & Jerry");
    }

    #[test]
    fn test_tracker_lone_carriage_return() {
        let text = "a\rb\r\nc\nd";
        let mut tracker = PositionTracker::new(text);
        assert_eq!(tracker.position(2).line, 1);
        assert_eq!(tracker.position(5).line, 2);
        let last = tracker.position(7);
        assert_eq!(last.line, 3);
        assert_eq!(last.column, Some(0));
        // Going backwards restarts the scan
        assert_eq!(tracker.position(0).line, 0);
    }
}
