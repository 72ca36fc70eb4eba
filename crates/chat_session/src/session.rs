//! Single-flight conversation controller.
//!
//! One send cycle runs at a time: `Idle -> Sending -> Streaming ->
//! (Committed | Failed) -> Idle`. State lives in `Cell`/`RefCell` fields so a
//! second `send` can be attempted (and rejected) while the first is awaiting
//! the network. No borrow is held across an `.await`.

use std::cell::{Cell, RefCell};
use std::time::Instant;

use chat_api::{extract_completion, ChatMessage, ChatResponse, DeltaReader};
use streamchat::{
    Author, Clipboard, ClipboardError, ConversationView, EntryId, IncrementalRenderer,
};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::history::History;
use crate::transport::ChatTransport;

/// Where the current cycle is. `Committed` and `Failed` last only until the
/// cycle returns and the view is restored to `Idle`; the outcome of the most
/// recent cycle stays readable through [`ChatSession::last_settled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Streaming,
    Committed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Another cycle is in flight.
    Busy,
    /// Input was empty or whitespace-only.
    EmptyInput,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing happened: no request, no history change.
    Rejected(Rejection),
    /// The reply was received in full. Empty replies are not added to history.
    Committed { reply: String },
    /// The error message was appended; `partial` text stays on screen only.
    Failed { error: SessionError, partial: String },
}

impl SendOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

struct CycleFailure {
    error: SessionError,
    partial: String,
}

impl CycleFailure {
    fn new(error: impl Into<SessionError>, partial: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            partial: partial.into(),
        }
    }
}

pub struct ChatSession<T> {
    transport: T,
    renderer: IncrementalRenderer,
    config: SessionConfig,
    history: RefCell<History>,
    view: RefCell<ConversationView>,
    busy: Cell<bool>,
    phase: Cell<Phase>,
    settled: Cell<Option<Phase>>,
    /// Entries shown as plain text while the converter was not yet loaded.
    plain_entries: RefCell<Vec<(EntryId, String)>>,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, renderer: IncrementalRenderer, config: SessionConfig) -> Self {
        let history = match &config.greeting {
            Some(greeting) => History::with_greeting(greeting.clone()),
            None => History::new(),
        };
        let session = Self {
            transport,
            renderer,
            history: RefCell::new(history),
            view: RefCell::new(ConversationView::new()),
            busy: Cell::new(false),
            phase: Cell::new(Phase::Idle),
            settled: Cell::new(None),
            plain_entries: RefCell::new(Vec::new()),
            config,
        };

        if let Some(greeting) = session.config.greeting.clone() {
            let id = session.view.borrow_mut().push_entry(Author::Assistant);
            if let Err(error) = session.render_now(id, &greeting) {
                tracing::warn!(%error, "failed to render greeting");
            }
        }
        session
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Terminal phase (`Committed` or `Failed`) of the most recent cycle that
    /// ran; `None` before the first one. Rejected sends leave it unchanged.
    pub fn last_settled(&self) -> Option<Phase> {
        self.settled.get()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &IncrementalRenderer {
        &self.renderer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Snapshot of the conversation history.
    pub fn history(&self) -> History {
        self.history.borrow().clone()
    }

    /// Read the view. Do not call back into the session from `read`.
    pub fn with_view<R>(&self, read: impl FnOnce(&ConversationView) -> R) -> R {
        read(&self.view.borrow())
    }

    pub fn set_input(&self, value: impl Into<String>) {
        self.view.borrow_mut().input_mut().value = value.into();
    }

    /// Send whatever is in the input box.
    pub async fn submit_input(&self) -> SendOutcome {
        let value = self.view.borrow().input().value.clone();
        self.send(&value).await
    }

    /// Copy code block `index` of entry `id`, showing the acknowledgement.
    pub fn copy_code_block(
        &self,
        id: EntryId,
        index: usize,
        clipboard: &dyn Clipboard,
        now: Instant,
    ) -> Result<(), ClipboardError> {
        let mut view = self.view.borrow_mut();
        let entry = view
            .entry_mut(id)
            .ok_or(ClipboardError::NoSuchBlock { index })?;
        entry.copy_code_block(index, clipboard, now, self.renderer.config())
    }

    pub fn expire_copy_acks(&self, now: Instant) -> usize {
        self.view
            .borrow_mut()
            .expire_copy_acks(now, self.renderer.config())
    }

    /// Run one send cycle for `input`.
    ///
    /// A call made while another cycle is in flight, or with blank input, is
    /// rejected without side effects.
    pub async fn send(&self, input: &str) -> SendOutcome {
        if self.busy.get() {
            tracing::debug!("send ignored: a cycle is already in flight");
            return SendOutcome::Rejected(Rejection::Busy);
        }
        let message = input.trim();
        if message.is_empty() {
            return SendOutcome::Rejected(Rejection::EmptyInput);
        }

        let _guard = BusyGuard::engage(self);

        self.history.borrow_mut().push(ChatMessage::user(message));
        let user_entry = {
            let mut view = self.view.borrow_mut();
            view.input_mut().value.clear();
            view.push_entry(Author::User)
        };
        if let Err(error) = self.present(user_entry, message).await {
            tracing::warn!(%error, "failed to render user message");
        }

        match self.run_cycle().await {
            Ok(reply) => {
                self.settle(Phase::Committed);
                if !reply.is_empty() {
                    self.history
                        .borrow_mut()
                        .push(ChatMessage::assistant(reply.clone()));
                }
                tracing::debug!(chars = reply.chars().count(), "reply committed");
                SendOutcome::Committed { reply }
            }
            Err(failure) => {
                self.settle(Phase::Failed);
                tracing::warn!(error = %failure.error, "chat cycle failed");
                let error_message = self.config.error_message.clone();
                self.history
                    .borrow_mut()
                    .push(ChatMessage::assistant(error_message.clone()));
                let id = self.view.borrow_mut().push_entry(Author::Assistant);
                if let Err(error) = self.present(id, &error_message).await {
                    tracing::warn!(%error, "failed to render error message");
                }
                SendOutcome::Failed {
                    error: failure.error,
                    partial: failure.partial,
                }
            }
        }
    }

    fn settle(&self, phase: Phase) {
        self.phase.set(phase);
        self.settled.set(Some(phase));
    }

    async fn run_cycle(&self) -> Result<String, CycleFailure> {
        let request = self.history.borrow().to_request();
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|error| CycleFailure::new(error, ""))?;

        self.phase.set(Phase::Streaming);
        let entry = self.view.borrow_mut().push_entry(Author::Assistant);

        match response {
            ChatResponse::Complete(body) => {
                let reply = extract_completion(&body)
                    .map_err(|error| CycleFailure::new(SessionError::MalformedCompletion(error), ""))?;
                if !reply.is_empty() {
                    self.present(entry, &reply)
                        .await
                        .map_err(|error| CycleFailure::new(error, reply.clone()))?;
                }
                Ok(reply)
            }
            ChatResponse::Stream(body) => {
                let mut reader = DeltaReader::new(body);
                let mut text = String::new();
                while let Some(delta) = reader.next_delta().await {
                    match delta {
                        Ok(delta) => {
                            text.push_str(&delta);
                            self.present(entry, &text)
                                .await
                                .map_err(|error| CycleFailure::new(error, text.clone()))?;
                        }
                        Err(error) => return Err(CycleFailure::new(error, text)),
                    }
                }
                if reader.malformed_frames() > 0 {
                    tracing::debug!(
                        skipped = reader.malformed_frames(),
                        "stream finished with skipped frames"
                    );
                }
                Ok(text)
            }
        }
    }

    /// Render `text` into `id`, loading the converter on first use and
    /// upgrading earlier plain-text entries once it becomes available.
    async fn present(&self, id: EntryId, text: &str) -> Result<(), SessionError> {
        self.render_now(id, text)?;

        if self.renderer.capability().is_settled() {
            return Ok(());
        }
        if self.renderer.load_converter().await {
            let upgrades = std::mem::take(&mut *self.plain_entries.borrow_mut());
            let mut view = self.view.borrow_mut();
            for (entry, text) in upgrades {
                self.renderer.render(&mut view, entry, &text)?;
            }
        } else {
            self.plain_entries.borrow_mut().clear();
        }
        Ok(())
    }

    fn render_now(&self, id: EntryId, text: &str) -> Result<(), SessionError> {
        let pass = self.renderer.render(&mut self.view.borrow_mut(), id, text)?;
        if pass.awaiting_converter {
            let mut plain = self.plain_entries.borrow_mut();
            match plain.iter_mut().find(|(entry, _)| *entry == id) {
                Some((_, pending)) => *pending = text.to_string(),
                None => plain.push((id, text.to_string())),
            }
        }
        Ok(())
    }
}

/// Holds the busy flag for one cycle and restores an interactive view on
/// drop, including when the cycle future is dropped mid-flight.
struct BusyGuard<'a, T> {
    session: &'a ChatSession<T>,
}

impl<'a, T> BusyGuard<'a, T> {
    fn engage(session: &'a ChatSession<T>) -> Self {
        session.busy.set(true);
        session.phase.set(Phase::Sending);
        let mut view = session.view.borrow_mut();
        view.input_mut().enabled = false;
        view.set_typing(true);
        drop(view);
        Self { session }
    }
}

impl<T> Drop for BusyGuard<'_, T> {
    fn drop(&mut self) {
        self.session.busy.set(false);
        self.session.phase.set(Phase::Idle);
        if let Ok(mut view) = self.session.view.try_borrow_mut() {
            view.set_typing(false);
            let input = view.input_mut();
            input.enabled = true;
            input.focused = true;
        }
    }
}
