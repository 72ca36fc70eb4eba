//! HTML fragment tree and sanitizer.

pub mod sanitize;
pub mod tree;

pub use sanitize::{is_javascript_url, sanitize, sanitize_fragment, BLOCKED_TAGS};
pub use tree::{Attribute, Element, Fragment, Node};
