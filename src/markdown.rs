//! Markdown converter capability.
//!
//! The converter starts out `Unavailable` and is loaded at most once through a
//! [`ConverterLoader`]. Concurrent `load` calls await the same in-flight
//! attempt; a failed attempt is remembered and never retried.

use std::fmt;
use std::sync::Arc;

pub use futures_util::future::BoxFuture;
use tokio::sync::OnceCell;

use crate::error::{LoadError, RenderError};

/// Pure markdown-to-HTML conversion.
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> Result<String, RenderError>;
}

/// Produces a converter, possibly asynchronously.
pub trait ConverterLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn MarkdownConverter>, LoadError>>;
}

/// GitHub-flavored markdown via the `markdown` crate.
///
/// Raw HTML passes through untouched; the sanitizer is the only gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct GfmConverter;

impl MarkdownConverter for GfmConverter {
    fn to_html(&self, source: &str) -> Result<String, RenderError> {
        let options = markdown::Options {
            compile: markdown::CompileOptions {
                allow_dangerous_html: true,
                ..markdown::CompileOptions::gfm()
            },
            ..markdown::Options::gfm()
        };
        markdown::to_html_with_options(source, &options)
            .map_err(|error| RenderError::Conversion(error.to_string()))
    }
}

/// Loader for the converter compiled into this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledLoader;

impl ConverterLoader for BundledLoader {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn MarkdownConverter>, LoadError>> {
        Box::pin(async { Ok(Arc::new(GfmConverter) as Arc<dyn MarkdownConverter>) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityState {
    /// Not loaded yet, or the one load attempt failed.
    Unavailable,
    Available,
}

pub struct MarkdownCapability {
    loader: Box<dyn ConverterLoader>,
    cell: OnceCell<Option<Arc<dyn MarkdownConverter>>>,
}

impl MarkdownCapability {
    pub fn new(loader: impl ConverterLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    /// Capability that is available immediately, without a load step.
    pub fn ready(converter: impl MarkdownConverter + 'static) -> Self {
        let converter: Arc<dyn MarkdownConverter> = Arc::new(converter);
        Self {
            loader: Box::new(BundledLoader),
            cell: OnceCell::new_with(Some(Some(converter))),
        }
    }

    pub fn bundled() -> Self {
        Self::new(BundledLoader)
    }

    pub fn state(&self) -> CapabilityState {
        match self.cell.get() {
            Some(Some(_)) => CapabilityState::Available,
            _ => CapabilityState::Unavailable,
        }
    }

    /// Whether a load attempt has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.cell.initialized()
    }

    pub fn converter(&self) -> Option<Arc<dyn MarkdownConverter>> {
        self.cell.get().and_then(Clone::clone)
    }

    /// Run the loader once and report the resulting state.
    pub async fn load(&self) -> CapabilityState {
        self.cell
            .get_or_init(|| async {
                match self.loader.load().await {
                    Ok(converter) => {
                        tracing::debug!("markdown converter loaded");
                        Some(converter)
                    }
                    Err(error) => {
                        tracing::warn!(%error, "markdown converter failed to load; staying on plain text");
                        None
                    }
                }
            })
            .await;
        self.state()
    }
}

impl Default for MarkdownCapability {
    fn default() -> Self {
        Self::bundled()
    }
}

impl fmt::Debug for MarkdownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownCapability")
            .field("state", &self.state())
            .field("settled", &self.is_settled())
            .finish()
    }
}
