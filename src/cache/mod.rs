//! Build-state caching
//!
//! The flatpak-builder state directory is cached under a content-addressed
//! key derived from the manifest bytes. Same manifest = same cache.

mod key;
mod store;

pub use key::{derive_key, resolve_key, FALLBACK_PREFIXES, KEY_PREFIX};
pub use store::{BuildCache, DirCache};
