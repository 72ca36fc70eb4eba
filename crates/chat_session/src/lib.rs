//! Conversation session controller.
//!
//! Owns the history and the conversation view, runs one send cycle at a time
//! against a [`ChatTransport`], and feeds streamed deltas to the
//! [`streamchat::IncrementalRenderer`].

pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod transport;

pub use config::{SessionConfig, DEFAULT_ERROR_MESSAGE};
pub use error::SessionError;
pub use history::History;
pub use session::{ChatSession, Phase, Rejection, SendOutcome};
pub use transport::ChatTransport;
