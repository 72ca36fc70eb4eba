//! View configuration.

use std::time::Duration;

pub const DEFAULT_COPY_LABEL: &str = "Copy";
pub const DEFAULT_COPIED_LABEL: &str = "Copied!";
pub const DEFAULT_COPY_ACK_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub copy_label: String,
    pub copied_label: String,
    pub copy_ack_duration: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            copy_label: DEFAULT_COPY_LABEL.to_string(),
            copied_label: DEFAULT_COPIED_LABEL.to_string(),
            copy_ack_duration: DEFAULT_COPY_ACK_DURATION,
        }
    }
}

impl ViewConfig {
    pub fn with_copy_label(mut self, label: impl Into<String>) -> Self {
        self.copy_label = label.into();
        self
    }

    pub fn with_copied_label(mut self, label: impl Into<String>) -> Self {
        self.copied_label = label.into();
        self
    }

    pub fn with_copy_ack_duration(mut self, duration: Duration) -> Self {
        self.copy_ack_duration = duration;
        self
    }
}
