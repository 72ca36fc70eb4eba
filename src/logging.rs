//! Diagnostic logging setup for hosts embedding the renderer.
//!
//! Library code only emits `tracing` events (malformed frames, render
//! fallbacks, converter load failures, clipboard fallbacks). Installing a
//! subscriber is the host's call; this helper wires the usual stderr one.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "streamchat=info,chat_api=info,chat_session=info";

/// Install a global stderr subscriber filtered by `RUST_LOG`, else `default_filter`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn try_init_tracing(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
