/// Shown (and kept in history) when a send cycle fails.
pub const DEFAULT_ERROR_MESSAGE: &str =
    "\u{26a0}\u{fe0f} Sorry, something went wrong while processing the response.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub error_message: String,
    /// Assistant message the conversation opens with, if any.
    pub greeting: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            greeting: None,
        }
    }
}

impl SessionConfig {
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }
}
