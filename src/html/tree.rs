//! Detached HTML node tree.
//!
//! Markup is parsed with html5ever's fragment parser into an `RcDom` and then
//! copied into plain owned nodes. Nothing here is attached to a live document,
//! so parsing never runs scripts or loads resources.

use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name; foreign attributes such as `xlink:href` keep their
    /// namespace here and their bare local name in `name.local`.
    pub name: QualName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualName,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// Ordered list of top-level nodes; the content of one render target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Attribute {
    /// Attribute without a namespace, as written on HTML elements.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
            value: value.into(),
        }
    }

    /// Name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    fn is_plain(&self, name: &str) -> bool {
        self.name.ns.is_empty() && self.local_name() == name
    }
}

impl Element {
    /// Element in the HTML namespace.
    pub fn new(tag: &str) -> Self {
        Self {
            name: QualName::new(
                None,
                Namespace::from(HTML_NAMESPACE),
                LocalName::from(tag),
            ),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.name.local
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.is_plain(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|attr| attr.is_plain(name)) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute::new(name, value)),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag().eq_ignore_ascii_case(tag)
    }

    /// Direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// First descendant element (depth-first, document order) with `tag`.
    pub fn find_descendant(&self, tag: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.is(tag) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl Fragment {
    /// Parse markup as the children of a `<body>` element.
    pub fn parse(html: &str) -> Self {
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from("body"),
        );
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
            .one(html);

        // Fragment parsing yields document -> <html> -> parsed nodes.
        let mut nodes = Vec::new();
        for root in dom.document.children.borrow().iter() {
            for child in root.children.borrow().iter() {
                if let Some(node) = convert(child) {
                    nodes.push(node);
                }
            }
        }
        Self { nodes }
    }

    /// A fragment holding `text` as a single escaped text node.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            nodes: vec![Node::Text(text)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }

    /// Visit every element in document order.
    pub fn for_each_element_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        walk_elements_mut(&mut self.nodes, visit);
    }

    /// Serialize with html5ever's HTML serializer: escaping, void elements
    /// and raw-text containers follow its rules.
    pub fn to_html(&self) -> String {
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..SerializeOpts::default()
        };
        let mut out = Vec::new();
        if let Err(error) = serialize(&mut out, self, opts) {
            tracing::warn!(%error, "html serialization stopped early");
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl Serialize for Fragment {
    fn serialize<S>(&self, serializer: &mut S, _scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        serialize_nodes(&self.nodes, serializer)
    }
}

fn walk_elements_mut(nodes: &mut [Node], visit: &mut dyn FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(element) = node {
            visit(element);
            walk_elements_mut(&mut element.children, visit);
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
            Node::Comment(_) => {}
        }
    }
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| Attribute {
                    name: attr.name.clone(),
                    value: attr.value.to_string(),
                })
                .collect();
            let children = handle
                .children
                .borrow()
                .iter()
                .filter_map(convert)
                .collect();
            Some(Node::Element(Element {
                name: name.clone(),
                attrs,
                children,
            }))
        }
        _ => None,
    }
}

fn serialize_nodes<S: Serializer>(nodes: &[Node], serializer: &mut S) -> io::Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => serializer.write_text(text)?,
            Node::Comment(text) => serializer.write_comment(text)?,
            Node::Element(element) => {
                let attrs = element
                    .attrs
                    .iter()
                    .map(|attr| (&attr.name, attr.value.as_str()));
                serializer.start_elem(element.name.clone(), attrs)?;
                serialize_nodes(&element.children, serializer)?;
                serializer.end_elem(element.name.clone())?;
            }
        }
    }
    Ok(())
}
