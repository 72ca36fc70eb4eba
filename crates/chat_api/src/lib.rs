//! Transport-only chat API client primitives.
//!
//! This crate owns request building, response classification, SSE framing and
//! response-schema normalization for the `/api/chat` endpoint. It contains no
//! rendering or conversation state.
//!
//! Two response schemas are normalized into one text delta: the worker-style
//! `{"response": "..."}` payload and the OpenAI-style
//! `{"choices":[{"delta":{"content":"..."}}]}` payload. See [`extract_delta`].

pub mod client;
pub mod config;
pub mod delta;
pub mod error;
pub mod headers;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::{ByteStream, ChatApiClient, ChatResponse, DeltaReader};
pub use config::ChatApiConfig;
pub use delta::{extract_completion, extract_delta, StreamSignal, DONE_SENTINEL};
pub use error::ChatApiError;
pub use payload::{ChatMessage, ChatRequest, Role};
pub use sse::{split_frames, DecodedFrames, SseFrameDecoder};
pub use url::normalize_chat_url;

pub use reqwest::StatusCode;
