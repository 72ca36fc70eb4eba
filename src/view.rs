//! Conversation view model: the render targets the renderer writes into.

use std::time::Instant;

use crate::clipboard::Clipboard;
use crate::config::ViewConfig;
use crate::error::ClipboardError;
use crate::html::Fragment;
use crate::render::code_blocks::{collect_code_blocks, set_copy_label, CodeBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Position of an entry in its [`ConversationView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CopyAck {
    block: usize,
    until: Instant,
}

/// One message bubble and its current markup.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    author: Author,
    content: Fragment,
    copy_acks: Vec<CopyAck>,
}

impl MessageEntry {
    fn new(author: Author) -> Self {
        Self {
            author,
            content: Fragment::default(),
            copy_acks: Vec::new(),
        }
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    /// Replace the markup wholesale. Pending copy acknowledgements belong to
    /// the old markup and are dropped.
    pub fn set_content(&mut self, content: Fragment) {
        self.content = content;
        self.copy_acks.clear();
    }

    pub fn markup(&self) -> String {
        self.content.to_html()
    }

    pub fn text(&self) -> String {
        self.content.text_content()
    }

    pub fn code_blocks(&self) -> Vec<CodeBlock> {
        collect_code_blocks(&self.content)
    }

    /// Copy block `index` to `clipboard` and show the "copied" label until
    /// `now + copy_ack_duration`. On failure the label is left alone.
    pub fn copy_code_block(
        &mut self,
        index: usize,
        clipboard: &dyn Clipboard,
        now: Instant,
        config: &ViewConfig,
    ) -> Result<(), ClipboardError> {
        let block = self
            .code_blocks()
            .into_iter()
            .nth(index)
            .ok_or(ClipboardError::NoSuchBlock { index })?;

        clipboard.write_text(&block.code)?;

        if set_copy_label(&mut self.content, index, &config.copied_label) {
            let until = now + config.copy_ack_duration;
            self.copy_acks.retain(|ack| ack.block != index);
            self.copy_acks.push(CopyAck {
                block: index,
                until,
            });
        }
        Ok(())
    }

    /// Revert labels whose acknowledgement window has passed. Returns how
    /// many were reverted.
    pub fn expire_copy_acks(&mut self, now: Instant, config: &ViewConfig) -> usize {
        let (expired, live): (Vec<CopyAck>, Vec<CopyAck>) =
            self.copy_acks.iter().copied().partition(|ack| ack.until <= now);
        self.copy_acks = live;
        for ack in &expired {
            set_copy_label(&mut self.content, ack.block, &config.copy_label);
        }
        expired.len()
    }

    pub fn has_pending_copy_ack(&self) -> bool {
        !self.copy_acks.is_empty()
    }
}

/// State of the message input and send button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAffordances {
    pub value: String,
    pub enabled: bool,
    pub focused: bool,
}

impl Default for InputAffordances {
    fn default() -> Self {
        Self {
            value: String::new(),
            enabled: true,
            focused: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationView {
    entries: Vec<MessageEntry>,
    scroll_requests: usize,
    typing: bool,
    input: InputAffordances,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty entry.
    pub fn push_entry(&mut self, author: Author) -> EntryId {
        self.entries.push(MessageEntry::new(author));
        self.request_scroll_to_bottom();
        EntryId(self.entries.len() - 1)
    }

    /// Append an entry with already-rendered markup.
    pub fn push_rendered(&mut self, author: Author, content: Fragment) -> EntryId {
        let id = self.push_entry(author);
        self.entries[id.0].content = content;
        id
    }

    pub fn entry(&self, id: EntryId) -> Option<&MessageEntry> {
        self.entries.get(id.0)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut MessageEntry> {
        self.entries.get_mut(id.0)
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    pub fn request_scroll_to_bottom(&mut self) {
        self.scroll_requests += 1;
    }

    /// Number of scroll-to-bottom requests issued so far.
    pub fn scroll_requests(&self) -> usize {
        self.scroll_requests
    }

    pub fn set_typing(&mut self, visible: bool) {
        self.typing = visible;
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn input(&self) -> &InputAffordances {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputAffordances {
        &mut self.input
    }

    pub fn expire_copy_acks(&mut self, now: Instant, config: &ViewConfig) -> usize {
        self.entries
            .iter_mut()
            .map(|entry| entry.expire_copy_acks(now, config))
            .sum()
    }

    /// Whole-conversation markup.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<div id=\"chat-messages\">");
        for entry in &self.entries {
            out.push_str("<div class=\"message ");
            out.push_str(entry.author.as_str());
            out.push_str("\"><div class=\"message-content\">");
            out.push_str(&entry.markup());
            out.push_str("</div></div>");
        }
        if self.typing {
            out.push_str("<div id=\"typing-indicator\" class=\"visible\"></div>");
        }
        out.push_str("</div>");
        out
    }
}
