//! Shared test utilities for Hireline integration tests.
//!
//! This crate provides:
//! - [`MemoryBackend`]: in-memory [`PersistenceBridge`] with operation
//!   counters and failure injection
//! - [`ScriptedLookups`]: a [`LookupFetcher`] with per-key gates for
//!   controlling response completion order
//! - Fixtures: the canonical intake form schema and sample list rows
//!
//! [`PersistenceBridge`]: hireline_core::PersistenceBridge
//! [`LookupFetcher`]: hireline_core::LookupFetcher

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code.
#![allow(clippy::missing_panics_doc)]

pub mod backend;
pub mod fixtures;
pub mod lookups;

pub use backend::*;
pub use fixtures::*;
pub use lookups::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hireline=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
