//! Chat transcript rendering core.
//!
//! Streamed assistant replies arrive as growing markdown text. Each update is
//! rendered in full into a detached HTML fragment, sanitized, and decorated
//! with copy buttons and language labels on code blocks.
//!
//! # Public API Overview
//! - Parse, inspect, and sanitize HTML fragments ([`Fragment`], [`sanitize`]).
//! - Load the markdown converter once via [`MarkdownCapability`].
//! - Render entries of a [`ConversationView`] with [`IncrementalRenderer`].
//! - Copy code blocks through a [`Clipboard`] strategy.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod html;
pub mod logging;
pub mod markdown;
pub mod render;
pub mod view;

/// Clipboard strategies.
pub use crate::clipboard::{Clipboard, CommandClipboard, FallbackClipboard, SystemClipboard};
/// View configuration.
pub use crate::config::ViewConfig;
/// Error types.
pub use crate::error::{ClipboardError, LoadError, RenderError};
/// HTML tree and sanitizer.
pub use crate::html::{sanitize, sanitize_fragment, Attribute, Element, Fragment, Node};
/// Logging setup for hosts.
pub use crate::logging::{try_init_tracing, DEFAULT_LOG_FILTER};
/// Markdown converter capability.
pub use crate::markdown::{
    BundledLoader, CapabilityState, ConverterLoader, GfmConverter, MarkdownCapability,
    MarkdownConverter,
};
/// Incremental rendering and code-block augmentation.
pub use crate::render::{
    augment_code_blocks, CodeBlock, IncrementalRenderer, RenderMode, RenderPass,
};
/// Conversation view model.
pub use crate::view::{Author, ConversationView, EntryId, InputAffordances, MessageEntry};
