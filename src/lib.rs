//! flatbake - Flatpak build automation for CI
//!
//! Orchestrates flatpak-builder to produce a distributable bundle from a
//! declarative manifest: parse, patch for sandboxed tests, build with a
//! content-addressed state cache, bundle, and publish as a CI artifact.

pub mod artifact;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod flatpak;
pub mod manifest;
pub mod pipeline;

pub use error::{FlatbakeError, FlatbakeResult};
