use thiserror::Error;

/// A render pass could not produce markdown output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown conversion failed: {0}")]
    Conversion(String),

    #[error("render target {0} does not exist")]
    MissingEntry(usize),
}

/// The markdown converter could not be loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("markdown converter unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),

    #[error("failed to run clipboard command '{command}': {source}")]
    Command {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard command '{command}' exited with {status}")]
    CommandStatus {
        command: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("no clipboard command available on this platform")]
    NoCommand,

    #[error("code block {index} does not exist")]
    NoSuchBlock { index: usize },
}
