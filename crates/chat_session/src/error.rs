use chat_api::ChatApiError;
use streamchat::RenderError;
use thiserror::Error;

/// Why a send cycle ended in the failed state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("chat request failed: {0}")]
    Transport(#[from] ChatApiError),

    #[error("completion body is not valid JSON: {0}")]
    MalformedCompletion(#[source] serde_json::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}
