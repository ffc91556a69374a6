//! XML document handling
//!
//! Schema files are parsed into an owned, namespace-resolved element tree.
//! Every element carries its in-scope namespace context so QName-valued
//! attributes (`type`, `base`, `ref`) can be resolved later without the
//! original reader.

use std::sync::Arc;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, ParseError, Result};
use crate::namespaces::{NamespaceContext, QName};

/// One element of a parsed schema file
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name, namespace resolved against the in-scope context
    pub qname: QName,
    /// Prefix used on the tag, if any
    pub prefix: Option<String>,
    /// Element attributes keyed by their raw (possibly prefixed) name
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element
    pub declared: NamespaceContext,
    /// Namespace context in scope for this element
    pub namespaces: Arc<NamespaceContext>,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            prefix: None,
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            declared: NamespaceContext::new(),
            namespaces: Arc::new(NamespaceContext::new()),
        }
    }

    /// Local part of the tag name
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Resolved namespace of the tag, `None` when unqualified
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Attribute value by its raw (possibly prefixed) name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append text content
    pub fn append_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => self.text = Some(text.to_string()),
        }
    }

    /// Children with the given local name, in document order
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Number of elements in this subtree, including this one
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Element::subtree_size).sum::<usize>()
    }
}

/// A parsed schema file
#[derive(Debug, Default)]
pub struct Document {
    /// Top-level element, normally `xs:schema`
    pub root: Option<Element>,
}

impl Document {
    /// Document with no root element yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse schema markup held in a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse schema markup from raw bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let scope = element_stack.last().map(|p| p.namespaces.clone());
                    let element = Self::parse_element(&e, scope)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            Self::set_root(&mut doc, current)?;
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let scope = element_stack.last().map(|p| p.namespaces.clone());
                    let element = Self::parse_element(&e, scope)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        Self::set_root(&mut doc, element)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("bad text content: {}", e)))?;
                        if !text.trim().is_empty() {
                            current.append_text(text.trim());
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let raw = e.into_inner();
                        let text = String::from_utf8_lossy(&raw);
                        if !text.trim().is_empty() {
                            current.append_text(text.trim());
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "malformed markup at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                // comments, processing instructions, doctype
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!(
                "Unexpected end of document: element '{}' is not closed",
                open.local_name()
            )));
        }

        if doc.root.is_none() {
            return Err(Error::Parse(ParseError::new("Empty document")));
        }

        Ok(doc)
    }

    fn set_root(doc: &mut Document, element: Element) -> Result<()> {
        if doc.root.is_some() {
            return Err(Error::Xml(format!(
                "Multiple root elements: unexpected '{}'",
                element.local_name()
            )));
        }
        doc.root = Some(element);
        Ok(())
    }

    /// Parse element from BytesStart event, resolving names in `parent_scope`
    fn parse_element(
        start: &BytesStart,
        parent_scope: Option<Arc<NamespaceContext>>,
    ) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("tag name is not UTF-8: {}", e)))?
            .to_string();

        let mut declared = NamespaceContext::new();
        let mut attributes = IndexMap::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("bad attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("attribute name is not UTF-8: {}", e)))?;

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("bad attribute value: {}", e)))?
                .to_string();

            // xmlns declarations never show up as attributes
            if attr_name == "xmlns" {
                declared.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                declared.add_prefix(prefix, attr_value);
            } else {
                attributes.insert(attr_name.to_string(), attr_value);
            }
        }

        let namespaces = match parent_scope {
            Some(scope) if declared.is_empty() => scope,
            Some(scope) => Arc::new(scope.extended(&declared)),
            None => Arc::new(NamespaceContext::new().extended(&declared)),
        };

        // Undeclared prefixes are tolerated and leave the name without a namespace
        let (prefix, qname) = match name.split_once(':') {
            Some((prefix, local)) => (
                Some(prefix.to_string()),
                QName::new(namespaces.get_namespace(prefix), local),
            ),
            None => (
                None,
                QName::new(namespaces.get_default_namespace(), name.as_str()),
            ),
        };

        Ok(Element {
            qname,
            prefix,
            attributes,
            text: None,
            children: Vec::new(),
            declared,
            namespaces,
        })
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Take ownership of the root element
    pub fn into_root(self) -> Option<Element> {
        self.root
    }
}
