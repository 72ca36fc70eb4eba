//! Incremental renderer.
//!
//! Every call re-renders the whole accumulated text of one entry: markdown to
//! HTML, sanitize, augment code blocks, then request a scroll to the bottom.
//! There is no diffing against the previous pass.

use crate::config::ViewConfig;
use crate::error::RenderError;
use crate::html::{sanitize_fragment, Fragment};
use crate::markdown::{CapabilityState, MarkdownCapability};
use crate::render::code_blocks::augment_code_blocks;
use crate::view::{ConversationView, EntryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Markdown,
    /// Converter missing or failed; text shown escaped as-is.
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPass {
    pub mode: RenderMode,
    /// The converter has not been loaded yet; a later pass may upgrade this
    /// entry to markdown.
    pub awaiting_converter: bool,
    pub augmented_blocks: usize,
}

#[derive(Debug, Default)]
pub struct IncrementalRenderer {
    capability: MarkdownCapability,
    config: ViewConfig,
}

impl IncrementalRenderer {
    pub fn new(capability: MarkdownCapability, config: ViewConfig) -> Self {
        Self { capability, config }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn capability(&self) -> &MarkdownCapability {
        &self.capability
    }

    /// Load the converter if that has not been attempted yet. Returns whether
    /// markdown rendering is available afterwards.
    pub async fn load_converter(&self) -> bool {
        self.capability.load().await == CapabilityState::Available
    }

    /// Replace entry `id`'s markup with a fresh rendering of `full_text`.
    pub fn render(
        &self,
        view: &mut ConversationView,
        id: EntryId,
        full_text: &str,
    ) -> Result<RenderPass, RenderError> {
        let entry = view.entry_mut(id).ok_or(RenderError::MissingEntry(id.0))?;

        let (mut fragment, mode) = self.render_fragment(full_text);
        let augmented_blocks = augment_code_blocks(&mut fragment, &self.config);
        entry.set_content(fragment);
        view.request_scroll_to_bottom();

        Ok(RenderPass {
            mode,
            awaiting_converter: !self.capability.is_settled(),
            augmented_blocks,
        })
    }

    /// Sanitized markup for `text`, without augmentation.
    pub fn render_fragment(&self, text: &str) -> (Fragment, RenderMode) {
        let Some(converter) = self.capability.converter() else {
            return (Fragment::text(text), RenderMode::PlainText);
        };

        match converter.to_html(text) {
            Ok(html) => {
                let mut fragment = Fragment::parse(&html);
                sanitize_fragment(&mut fragment);
                (fragment, RenderMode::Markdown)
            }
            Err(error) => {
                tracing::warn!(%error, "markdown conversion failed; rendering plain text");
                (Fragment::text(text), RenderMode::PlainText)
            }
        }
    }
}
