//! Minimal owned XML element tree.
//!
//! Gamelist documents only need elements and text: attributes, comments and
//! processing instructions are dropped on read. [`XmlNode`] is the node type
//! metadata records read their fields from and append their fields to.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

/// Errors from reading or writing XML documents
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Malformed(String),

    #[error("Unexpected closing tag </{0}>")]
    UnbalancedTag(String),

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Failed to write XML: {0}")]
    Write(String),
}

/// An element with its text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    tag: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child element with the given tag
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Append a new empty child element and return it for filling in
    pub fn append_child(&mut self, tag: impl Into<String>) -> &mut XmlNode {
        self.children.push(XmlNode::new(tag));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn push_child(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<XmlNode, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| XmlError::Malformed(e.to_string()))?;

            match event {
                Event::Start(start) => {
                    stack.push(XmlNode::new(tag_name(&start)));
                }
                Event::Empty(start) => {
                    let node = XmlNode::new(tag_name(&start));
                    attach(&mut stack, &mut root, node);
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    let mut node = stack.pop().ok_or(XmlError::UnbalancedTag(name))?;
                    // Indentation between child elements is not content
                    if !node.children.is_empty() && node.text.trim().is_empty() {
                        node.text.clear();
                    }
                    attach(&mut stack, &mut root, node);
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| XmlError::Malformed(e.to_string()))?;
                        top.text.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Malformed(format!("unclosed element <{}>", open.tag)));
        }

        root.ok_or(XmlError::EmptyDocument)
    }

    /// Render this element as an indented document with an XML declaration.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_err)?;
        write_node(&mut writer, self)?;

        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| XmlError::Write(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            // Only the first top-level element counts as the document root
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn write_err<E: std::fmt::Display>(e: E) -> XmlError {
    XmlError::Write(e.to_string())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    // Empty leaves are self-closing so indentation never leaks into their text
    if node.children.is_empty() && node.text.is_empty() {
        return writer
            .write_event(Event::Empty(BytesStart::new(node.tag.as_str())))
            .map_err(write_err);
    }

    writer
        .write_event(Event::Start(BytesStart::new(node.tag.as_str())))
        .map_err(write_err)?;

    if node.children.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&node.text)))
            .map_err(write_err)?;
    } else {
        for child in &node.children {
            write_node(writer, child)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(write_err)
}
