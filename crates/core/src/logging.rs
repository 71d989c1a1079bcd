//! Structured logging infrastructure for Cryptoplane.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::{self, writer::MakeWriter, TestWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Human-readable layer shared by [`init`] and [`try_init`].
fn text_layer<S, W>(writer: W) -> fmt::Layer<S, DefaultFields, Format, W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(writer)
}

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use cryptoplane_core::logging;
///
/// logging::init();
/// tracing::info!("Key service started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(text_layer(std::io::stdout))
        .init();
}

/// Initialize the logging system with JSON output for production environments.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
///
/// # Example
/// ```no_run
/// use cryptoplane_core::logging;
///
/// logging::init_json();
/// tracing::info!(worker = "pk-keygen", "Worker started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Like [`init`], but tolerates a subscriber that is already installed.
///
/// Intended for tests, where many cases share one process.
pub fn try_init() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(text_layer(TestWriter::new()))
        .try_init()
        .is_ok()
}
