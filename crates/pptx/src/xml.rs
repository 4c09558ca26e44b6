//! Minimal XML element tree over quick-xml events.
//!
//! Parts are small enough to hold in memory, and the builder needs to look
//! ahead (a shape's placeholder type decides how its text is used), so each
//! part is parsed once into a tree of [`XmlElement`]s. Element names are
//! stored without their namespace prefix; attribute keys keep theirs.

use deck_core::FormatError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its prefix-stripped name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Attribute by exact (possibly prefixed) key, e.g. `"id"` or `"r:id"`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Namespaced attribute by local name, whatever its prefix.
    ///
    /// `<p:sldId id="256" r:id="rId2"/>` yields `"rId2"` for `"id"`.
    pub fn prefixed_attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| {
                k.split_once(':')
                    .map_or(false, |(prefix, name)| prefix != "xmlns" && name == local)
            })
            .map(|(_, v)| v.as_str())
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Follow a path of child names.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    /// All descendant elements with the given name, depth-first.
    pub fn descendants<'a>(&'a self, name: &'a str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        collect_descendants(self, name, &mut found);
        found
    }

    /// Direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }
}

fn collect_descendants<'a>(el: &'a XmlElement, name: &str, found: &mut Vec<&'a XmlElement>) {
    for child in el.elements() {
        if child.name == name {
            found.push(child);
        }
        collect_descendants(child, name, found);
    }
}

/// Parse a whole part into its root element.
pub fn parse_document(part: &str, xml: &str) -> Result<XmlElement, FormatError> {
    let malformed = |message: String| FormatError::MalformedXml {
        part: part.to_string(),
        message,
    };

    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(element_from(e).map_err(malformed)?),
            Ok(Event::Empty(ref e)) => {
                let el = element_from(e).map_err(malformed)?;
                attach(&mut stack, &mut root, el);
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, el);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| malformed(e.to_string()))?;
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e).into_owned();
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e.to_string())),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| malformed("no root element".to_string()))
}

fn element_from(e: &BytesStart<'_>) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push((key, value.into_owned()));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
