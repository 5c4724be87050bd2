//! Structural comparison and path extraction for JSON and XML values.

use std::collections::BTreeMap;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

/// Normalized XML tree used for structural equality.
///
/// Attribute order is irrelevant, element order is significant, and text is
/// compared with surrounding whitespace trimmed. Comments and processing
/// instructions are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element {
        name: String,
        attributes: BTreeMap<String, String>,
        children: Vec<XmlNode>,
    },
    Text(String),
}

impl XmlNode {
    /// Parse a document into its root element's normalized tree.
    pub fn parse(text: &str) -> Result<XmlNode, String> {
        let package = parser::parse(text).map_err(|e| format!("{e:?}"))?;
        let document = package.as_document();
        document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(from_element(element)),
                _ => None,
            })
            .ok_or_else(|| "document has no root element".to_string())
    }
}

fn qualified_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(ns) => format!("{{{ns}}}{local}"),
        None => local.to_string(),
    }
}

fn from_element(element: Element<'_>) -> XmlNode {
    let name = element.name();
    let attributes = element
        .attributes()
        .into_iter()
        .map(|attr| {
            let attr_name = attr.name();
            (
                qualified_name(attr_name.namespace_uri(), attr_name.local_part()),
                attr.value().to_string(),
            )
        })
        .collect();

    let mut children = Vec::new();
    for child in element.children() {
        match child {
            ChildOfElement::Element(e) => children.push(from_element(e)),
            ChildOfElement::Text(t) => {
                let trimmed = t.text().trim();
                if trimmed.is_empty() {
                    continue;
                }
                // Adjacent text (e.g. split by a comment) reads as one run
                if let Some(XmlNode::Text(prev)) = children.last_mut() {
                    prev.push_str(trimmed);
                } else {
                    children.push(XmlNode::Text(trimmed.to_string()));
                }
            }
            _ => {}
        }
    }

    XmlNode::Element {
        name: qualified_name(name.namespace_uri(), name.local_part()),
        attributes,
        children,
    }
}

/// Whether an XPath expression selects something from an XML body.
///
/// A non-empty node-set, `true`, a non-empty string or a real number count as
/// a selection. Bodies that are not well-formed XML select nothing.
pub fn xpath_selects(body: &str, expression: &str) -> bool {
    use sxd_xpath::{evaluate_xpath, Value};

    let Ok(package) = parser::parse(body) else {
        return false;
    };
    let document = package.as_document();

    match evaluate_xpath(&document, expression) {
        Ok(Value::Nodeset(nodes)) => nodes.size() > 0,
        Ok(Value::Boolean(b)) => b,
        Ok(Value::String(s)) => !s.is_empty(),
        Ok(Value::Number(n)) => !n.is_nan(),
        Err(_) => false,
    }
}

/// Check that an XPath expression compiles.
pub fn validate_xpath(expression: &str) -> Result<(), String> {
    match sxd_xpath::Factory::new().build(expression) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err("empty expression".to_string()),
        Err(e) => Err(format!("{e:?}")),
    }
}
