//! Observability infrastructure: structured logging with consistent spans.
//!
//! This module provides initialization helpers and span constructors used
//! across Hireline components. Initialization is Once-guarded so libraries
//! and tests can call it unconditionally.

use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times; subsequent
/// calls are no-ops. Levels come from `RUST_LOG` (default `info`).
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for a persistence-bridge operation.
#[must_use]
pub fn bridge_span(operation: &str, resource: &str) -> Span {
    tracing::info_span!("bridge", op = operation, resource = resource)
}

/// Creates a span for a lookup fetch.
#[must_use]
pub fn lookup_span(category: &str) -> Span {
    tracing::info_span!("lookup", category = category)
}
