use std::collections::BTreeMap;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::ElementHandle;

/// Owned snapshot of a node that entered or left the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(DomElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    /// Live handle into the host page, when the host can provide one.
    pub handle: Option<ElementHandle>,
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<DomNode>,
}

impl DomNode {
    /// Parses an HTML fragment into its top-level nodes.
    pub fn parse_fragment(html: &str) -> Vec<DomNode> {
        let fragment = Html::parse_fragment(html);
        fragment
            .root_element()
            .children()
            .filter_map(convert_node)
            .collect()
    }

    /// Parses an HTML fragment and returns its first top-level node.
    pub fn parse(html: &str) -> Option<DomNode> {
        Self::parse_fragment(html).into_iter().next()
    }

    pub fn text(text: impl Into<String>) -> DomNode {
        DomNode::Text(text.into())
    }

    /// Attaches a host handle to the root element; text nodes are returned unchanged.
    pub fn with_handle(mut self, handle: ElementHandle) -> DomNode {
        if let DomNode::Element(element) = &mut self {
            element.handle = Some(handle);
        }
        self
    }

    pub fn as_element(&self) -> Option<&DomElement> {
        match self {
            DomNode::Element(element) => Some(element),
            DomNode::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            DomNode::Text(text) => out.push_str(text),
            DomNode::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// This node and all descendant elements, in document order.
    pub fn elements(&self) -> Vec<&DomElement> {
        match self {
            DomNode::Element(element) => element.elements(),
            DomNode::Text(_) => Vec::new(),
        }
    }
}

impl DomElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// True when any class contains `fragment`, ignoring ASCII case.
    pub fn class_contains(&self, fragment: &str) -> bool {
        let fragment = fragment.to_ascii_lowercase();
        self.classes()
            .any(|class| class.to_ascii_lowercase().contains(&fragment))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// This element and all descendant elements, in document order.
    pub fn elements(&self) -> Vec<&DomElement> {
        let mut out = Vec::new();
        self.collect_elements(&mut out);
        out
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    fn collect_elements<'a>(&'a self, out: &mut Vec<&'a DomElement>) {
        out.push(self);
        for child in &self.children {
            if let DomNode::Element(element) = child {
                element.collect_elements(out);
            }
        }
    }
}

fn convert_node(node: NodeRef<'_, Node>) -> Option<DomNode> {
    match node.value() {
        Node::Text(text) => Some(DomNode::Text(String::from(&**text))),
        Node::Element(_) => ElementRef::wrap(node).map(convert_element),
        _ => None,
    }
}

fn convert_element(element: ElementRef<'_>) -> DomNode {
    let value = element.value();
    DomNode::Element(DomElement {
        handle: None,
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(name, val)| (name.to_string(), val.to_string()))
            .collect(),
        children: element.children().filter_map(convert_node).collect(),
    })
}
