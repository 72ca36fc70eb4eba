//! Clipboard strategies for the code-block copy button.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::ClipboardError;

pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The platform clipboard through `arboard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|error| ClipboardError::Unavailable(error.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|error| ClipboardError::Write(error.to_string()))
    }
}

/// Pipes text into a platform copy command (`pbcopy`, `wl-copy`, `xclip`).
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    candidates: Vec<CopyCommand>,
}

type CopyCommand = (&'static str, &'static [&'static str]);

const MACOS_COMMANDS: &[CopyCommand] = &[("pbcopy", &[])];
const WINDOWS_COMMANDS: &[CopyCommand] = &[("clip", &[])];
const UNIX_COMMANDS: &[CopyCommand] = &[("wl-copy", &[]), ("xclip", &["-selection", "clipboard"])];

impl Default for CommandClipboard {
    fn default() -> Self {
        let candidates = if cfg!(target_os = "macos") {
            MACOS_COMMANDS
        } else if cfg!(windows) {
            WINDOWS_COMMANDS
        } else {
            UNIX_COMMANDS
        };
        Self {
            candidates: candidates.to_vec(),
        }
    }
}

impl CommandClipboard {
    /// Use a single explicit command.
    pub fn with_command(program: &'static str, args: &'static [&'static str]) -> Self {
        Self {
            candidates: vec![(program, args)],
        }
    }

    fn run(program: &'static str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Command {
                command: program,
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                // Reap the child before bailing so it does not linger as a zombie.
                let _ = child.kill();
                let _ = child.wait();
                return Err(ClipboardError::Command {
                    command: program,
                    source,
                });
            }
        }

        let status = child.wait().map_err(|source| ClipboardError::Command {
            command: program,
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandStatus {
                command: program,
                status,
            })
        }
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut last_error = None;
        for &(program, args) in &self.candidates {
            match Self::run(program, args, text) {
                Ok(()) => return Ok(()),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or(ClipboardError::NoCommand))
    }
}

/// Tries `primary`, then `fallback` when the primary write fails.
#[derive(Debug, Clone, Default)]
pub struct FallbackClipboard<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackClipboard<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl FallbackClipboard<SystemClipboard, CommandClipboard> {
    /// System clipboard first, copy command second.
    pub fn platform() -> Self {
        Self::new(SystemClipboard, CommandClipboard::default())
    }
}

impl<P: Clipboard, F: Clipboard> Clipboard for FallbackClipboard<P, F> {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        match self.primary.write_text(text) {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::debug!(%error, "primary clipboard failed; trying fallback");
                self.fallback.write_text(text)
            }
        }
    }
}
