//! Navigable document trees built on quick-xml.
//!
//! Two parse modes are supported:
//!
//! - **XML** - strict, used for decoded SAML messages. Mismatched or unclosed
//!   tags, bad attributes and unknown entities are errors.
//! - **HTML** - lenient, used for identity provider response pages. Void
//!   elements (`<input>`, `<meta>`, ...) need no end tag, stray end tags are
//!   ignored, unclosed elements are closed at end of input, element and
//!   attribute names are lowercased.
//!
//! quick-xml never expands external entities, so neither mode is exposed to XXE.
//! Both modes reject elements nested deeper than [`MAX_DEPTH`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::writer::Writer;
use quick_xml::Reader;
use thiserror::Error;

/// Name of the synthetic element holding the top-level nodes of a document.
const DOCUMENT_NODE: &str = "#document";

/// Deepest element nesting accepted in either mode.
pub const MAX_DEPTH: usize = 256;

/// HTML elements that never have content or an end tag.
const HTML_VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Failure to build a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{mode} parse error at byte {position}: {message}")]
pub struct ParseError {
    mode: ParseMode,
    position: u64,
    message: String,
}

impl ParseError {
    fn new(mode: ParseMode, position: u64, message: impl Into<String>) -> Self {
        Self {
            mode,
            position,
            message: message.into(),
        }
    }
}

/// How strictly the input is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Well-formed XML.
    Xml,
    /// Browser-style HTML.
    Html,
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml => f.write_str("XML"),
            Self::Html => f.write_str("HTML"),
        }
    }
}

/// A node of a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element(Element),
    /// Non-whitespace character data.
    Text(String),
}

/// An element of a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    /// Returns the qualified name, e.g. `samlp:Response`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name without its namespace prefix, e.g. `Response`.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Returns the value of the attribute with exactly this name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Returns the child nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Iterates over the child elements.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Iterates over the child elements with the given local name.
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children()
            .filter(move |element| element.local_name() == local_name)
    }

    /// Returns every element below this one, depth-first in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut pending: Vec<&Element> = self.children().collect();
        pending.reverse();
        while let Some(element) = pending.pop() {
            found.push(element);
            let start = pending.len();
            pending.extend(element.children());
            pending[start..].reverse();
        }
        found
    }

    /// Returns every element below this one with the given local name.
    #[must_use]
    pub fn descendants_named(&self, local_name: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|element| element.local_name() == local_name)
            .collect()
    }

    /// Returns the concatenated character data of this element and its descendants.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = String::new();
        let mut pending: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = pending.pop() {
            match node {
                Node::Text(value) => text.push_str(value),
                Node::Element(child) => pending.extend(child.children.iter().rev()),
            }
        }
        text
    }
}

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    top: Element,
}

impl Document {
    /// Returns the document element of an XML document.
    ///
    /// For HTML documents this is the first top-level element, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Element> {
        self.top.children().next()
    }

    /// Returns every element of the document with the given local name.
    #[must_use]
    pub fn elements_named(&self, local_name: &str) -> Vec<&Element> {
        self.top.descendants_named(local_name)
    }
}

/// A document with exactly one root element; the result of a strict XML parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    /// Returns the document element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// Builds document trees from strings.
pub struct DomBuilder;

impl DomBuilder {
    /// Parses a well-formed XML document with a single root element.
    pub fn parse_xml(input: &str) -> Result<XmlDocument, ParseError> {
        let top = build(input, ParseMode::Xml)?;
        let mut roots = top.children();
        let root = roots
            .next()
            .ok_or_else(|| ParseError::new(ParseMode::Xml, 0, "no root element"))?;
        if roots.next().is_some() {
            return Err(ParseError::new(
                ParseMode::Xml,
                0,
                "more than one root element",
            ));
        }
        if top.nodes().iter().any(|node| matches!(node, Node::Text(_))) {
            return Err(ParseError::new(
                ParseMode::Xml,
                0,
                "character data outside the root element",
            ));
        }
        Ok(XmlDocument { root: root.clone() })
    }

    /// Parses an HTML page leniently.
    pub fn parse_html(input: &str) -> Result<Document, ParseError> {
        build(input, ParseMode::Html).map(|top| Document { top })
    }
}

fn build(input: &str, mode: ParseMode) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.check_end_names = mode == ParseMode::Xml;
    // The tree below does its own end tag matching in HTML mode.
    config.allow_unmatched_ends = mode == ParseMode::Html;

    let mut stack = vec![Element::new(DOCUMENT_NODE.to_string(), Vec::new())];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ParseError::new(mode, reader.buffer_position(), e.to_string()))?;
        let position = reader.buffer_position();

        match event {
            Event::Start(ref start) => {
                let element = open_element(start, mode, position)?;
                if mode == ParseMode::Html && HTML_VOID_ELEMENTS.contains(&element.name.as_str())
                {
                    append(&mut stack, Node::Element(element));
                } else if stack.len() > MAX_DEPTH {
                    return Err(ParseError::new(
                        mode,
                        position,
                        format!("elements nested deeper than {MAX_DEPTH}"),
                    ));
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(ref start) => {
                let element = open_element(start, mode, position)?;
                append(&mut stack, Node::Element(element));
            }
            Event::End(ref end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match mode {
                    ParseMode::Xml => {
                        if stack.len() < 2 {
                            return Err(ParseError::new(
                                mode,
                                position,
                                format!("unexpected end tag </{name}>"),
                            ));
                        }
                        close_top(&mut stack);
                    }
                    ParseMode::Html => {
                        let name = name.to_ascii_lowercase();
                        if let Some(index) = stack.iter().rposition(|open| open.name == name) {
                            while index > 0 && stack.len() > index {
                                close_top(&mut stack);
                            }
                        }
                    }
                }
            }
            Event::Text(ref text) => {
                let value = match text.unescape() {
                    Ok(value) => value.into_owned(),
                    Err(_) if mode == ParseMode::Html => {
                        String::from_utf8_lossy(text).into_owned()
                    }
                    Err(e) => return Err(ParseError::new(mode, position, e.to_string())),
                };
                if !value.trim().is_empty() {
                    append(&mut stack, Node::Text(value));
                }
            }
            Event::CData(ref data) => {
                let value = String::from_utf8_lossy(data).into_owned();
                append(&mut stack, Node::Text(value));
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry nothing we check.
            _ => {}
        }
    }

    if stack.len() > 1 {
        if mode == ParseMode::Xml {
            let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
            return Err(ParseError::new(
                mode,
                reader.buffer_position(),
                format!("unclosed element <{open}>"),
            ));
        }
        while stack.len() > 1 {
            close_top(&mut stack);
        }
    }

    stack
        .pop()
        .ok_or_else(|| ParseError::new(mode, 0, "empty document"))
}

fn open_element(
    start: &BytesStart<'_>,
    mode: ParseMode,
    position: u64,
) -> Result<Element, ParseError> {
    let mut name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let attributes = match mode {
        ParseMode::Xml => start.attributes(),
        ParseMode::Html => {
            name.make_ascii_lowercase();
            start.html_attributes()
        }
    };

    let mut parsed = Vec::new();
    for attribute in attributes {
        let attribute = match attribute {
            Ok(attribute) => attribute,
            Err(_) if mode == ParseMode::Html => continue,
            Err(e) => return Err(ParseError::new(mode, position, e.to_string())),
        };
        let mut key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = match attribute.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) if mode == ParseMode::Html => {
                String::from_utf8_lossy(&attribute.value).into_owned()
            }
            Err(e) => return Err(ParseError::new(mode, position, e.to_string())),
        };
        if mode == ParseMode::Html {
            key.make_ascii_lowercase();
        }
        parsed.push((key, value));
    }

    Ok(Element::new(name, parsed))
}

fn append(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(element) = stack.pop() {
        append(stack, Node::Element(element));
    }
}

/// Re-indents an XML string for diagnostics.
///
/// Returns `None` if the input is not parseable XML.
#[must_use]
pub fn pretty_print_xml(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    loop {
        match reader.read_event().ok()? {
            Event::Eof => break,
            event => writer.write_event(event).ok()?,
        }
    }

    String::from_utf8(writer.into_inner()).ok()
}
