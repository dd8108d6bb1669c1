//! # hireline-client
//!
//! The REST implementation of Hireline's persistence bridge — the only crate
//! that performs network I/O. Everything else in the workspace talks to the
//! backend through [`hireline_core::PersistenceBridge`]; this crate provides
//! [`RestBridge`], which implements it over HTTP with `reqwest`.
//!
//! ## Configuration
//!
//! [`Config`] takes the API base URL and optional bearer token, with
//! environment fallbacks:
//!
//! - `HIRELINE_API_URL` — API endpoint (default: `http://localhost:8080`)
//! - `HIRELINE_API_TOKEN` — bearer token

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod paths;
pub mod rest;

pub use config::Config;
pub use rest::RestBridge;
