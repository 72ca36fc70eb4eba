//! Denylist HTML sanitizer for converter output.
//!
//! Best-effort defense in depth, not a full security parser: it removes the
//! known-dangerous elements and attributes below and leaves everything else
//! untouched. Exotic bypass vectors are out of its reach.

use super::tree::{Element, Fragment, Node};

/// Elements dropped together with their whole subtree.
pub const BLOCKED_TAGS: [&str; 7] = [
    "script", "style", "iframe", "object", "embed", "link", "meta",
];

const URL_ATTRIBUTES: [&str; 2] = ["href", "src"];
const STYLE_INJECTION_MARKERS: [&str; 2] = ["expression(", "url("];

/// Parse `html` into a detached tree, clean it, and serialize it back.
pub fn sanitize(html: &str) -> String {
    let mut fragment = Fragment::parse(html);
    sanitize_fragment(&mut fragment);
    fragment.to_html()
}

pub fn sanitize_fragment(fragment: &mut Fragment) {
    sanitize_nodes(&mut fragment.nodes);
}

fn sanitize_nodes(nodes: &mut Vec<Node>) {
    nodes.retain(|node| match node {
        Node::Element(element) => !is_blocked(element),
        _ => true,
    });
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            strip_attributes(element);
            sanitize_nodes(&mut element.children);
        }
    }
}

fn is_blocked(element: &Element) -> bool {
    BLOCKED_TAGS.iter().any(|tag| element.is(tag))
}

fn strip_attributes(element: &mut Element) {
    element.attrs.retain(|attr| {
        // Local name, so `xlink:href` is treated as `href`.
        let name = attr.local_name().to_ascii_lowercase();
        if name.starts_with("on") {
            return false;
        }
        if URL_ATTRIBUTES.contains(&name.as_str()) && is_javascript_url(&attr.value) {
            return false;
        }
        if name == "style" && has_style_injection(&attr.value) {
            return false;
        }
        true
    });
}

/// Case-insensitive `javascript:` scheme check, ignoring leading C0 controls
/// and spaces and the tab/newline characters URL parsers skip inside a scheme.
pub fn is_javascript_url(value: &str) -> bool {
    let normalized: String = value
        .trim_start_matches(|ch: char| ch <= '\u{20}' || ch.is_whitespace())
        .chars()
        .filter(|ch| !matches!(ch, '\t' | '\r' | '\n'))
        .flat_map(char::to_lowercase)
        .collect();
    normalized.starts_with("javascript:")
}

fn has_style_injection(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    STYLE_INJECTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
