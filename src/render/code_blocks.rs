//! Code-block augmentation: copy button and language label.

use once_cell::sync::OnceCell;
use regex::Regex;
use syntect::parsing::SyntaxSet;

use crate::config::ViewConfig;
use crate::html::{Element, Fragment, Node};

pub const COPY_BUTTON_CLASS: &str = "copy-btn";
pub const LANGUAGE_LABEL_CLASS: &str = "code-lang";

static SYNTAX_SET: OnceCell<SyntaxSet> = OnceCell::new();
static LANGUAGE_CLASS: OnceCell<Regex> = OnceCell::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn language_class_regex() -> &'static Regex {
    LANGUAGE_CLASS.get_or_init(|| {
        Regex::new(r"^(?:language|lang)-([A-Za-z0-9_+#.-]+)$").expect("valid language class regex")
    })
}

/// A rendered `pre` block as seen by copy handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

/// Add a copy button (and a language label when declared) to every `pre`
/// block that has no copy button yet. Returns how many blocks changed.
pub fn augment_code_blocks(fragment: &mut Fragment, config: &ViewConfig) -> usize {
    let mut augmented = 0;
    visit_blocks_mut(&mut fragment.nodes, &mut |_, pre| {
        if augment_block(pre, config) {
            augmented += 1;
        }
    });
    augmented
}

fn augment_block(pre: &mut Element, config: &ViewConfig) -> bool {
    if copy_button(pre).is_some() {
        return false;
    }

    let language = pre
        .find_descendant("code")
        .and_then(declared_language)
        .map(str::to_owned);
    if let Some(token) = language {
        let label = Element::new("span")
            .with_attr("class", LANGUAGE_LABEL_CLASS)
            .with_text(language_display_name(&token));
        pre.children.insert(0, label.into());
    }

    let button = Element::new("button")
        .with_attr("class", COPY_BUTTON_CLASS)
        .with_attr("type", "button")
        .with_text(config.copy_label.clone());
    pre.children.push(button.into());
    true
}

/// Language token from a `language-<x>` or `lang-<x>` class.
pub fn declared_language(code: &Element) -> Option<&str> {
    code.classes().find_map(|class| {
        language_class_regex()
            .captures(class)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str())
    })
}

/// Human-readable language name, or the raw token when unknown.
pub fn language_display_name(token: &str) -> String {
    syntax_set()
        .find_syntax_by_token(token)
        .map(|syntax| syntax.name.clone())
        .unwrap_or_else(|| token.to_string())
}

/// Code blocks of a fragment in document order.
pub fn collect_code_blocks(fragment: &Fragment) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    visit_blocks(&fragment.nodes, &mut |pre| blocks.push(code_block(pre)));
    blocks
}

fn code_block(pre: &Element) -> CodeBlock {
    match pre.find_descendant("code") {
        Some(code) => CodeBlock {
            language: declared_language(code).map(str::to_owned),
            code: code.text_content(),
        },
        None => {
            let code = pre
                .children
                .iter()
                .filter(|node| !node.as_element().is_some_and(is_augmentation))
                .map(|node| match node {
                    Node::Text(text) => text.clone(),
                    Node::Element(element) => element.text_content(),
                    Node::Comment(_) => String::new(),
                })
                .collect();
            CodeBlock {
                language: None,
                code,
            }
        }
    }
}

/// Replace the copy button label of block `index`. Returns `false` when the
/// block does not exist or has no button.
pub fn set_copy_label(fragment: &mut Fragment, index: usize, label: &str) -> bool {
    let mut updated = false;
    visit_blocks_mut(&mut fragment.nodes, &mut |position, pre| {
        if position != index {
            return;
        }
        if let Some(button) = copy_button_mut(pre) {
            button.children = vec![Node::Text(label.to_string())];
            updated = true;
        }
    });
    updated
}

fn is_augmentation(element: &Element) -> bool {
    (element.is("button") && element.has_class(COPY_BUTTON_CLASS))
        || (element.is("span") && element.has_class(LANGUAGE_LABEL_CLASS))
}

fn copy_button(pre: &Element) -> Option<&Element> {
    pre.child_elements()
        .find(|child| child.is("button") && child.has_class(COPY_BUTTON_CLASS))
}

fn copy_button_mut(pre: &mut Element) -> Option<&mut Element> {
    pre.child_elements_mut()
        .find(|child| child.is("button") && child.has_class(COPY_BUTTON_CLASS))
}

fn visit_blocks(nodes: &[Node], visit: &mut dyn FnMut(&Element)) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.is("pre") {
                visit(element);
            } else {
                visit_blocks(&element.children, visit);
            }
        }
    }
}

fn visit_blocks_mut(nodes: &mut [Node], visit: &mut dyn FnMut(usize, &mut Element)) {
    let mut index = 0;
    visit_blocks_mut_from(nodes, &mut index, visit);
}

fn visit_blocks_mut_from(
    nodes: &mut [Node],
    index: &mut usize,
    visit: &mut dyn FnMut(usize, &mut Element),
) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.is("pre") {
                visit(*index, element);
                *index += 1;
            } else {
                visit_blocks_mut_from(&mut element.children, index, visit);
            }
        }
    }
}
