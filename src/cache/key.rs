//! Cache key derivation
//!
//! Keys are content-addressed: SHA256 over the raw on-disk manifest bytes,
//! taken before any patching, so any byte change (whitespace included)
//! produces a new key.

use sha2::{Digest, Sha256};

/// Prefix of derived cache keys
pub const KEY_PREFIX: &str = "flatpak-builder-";

/// Prefixes tried in order when the exact key misses, most specific first
pub const FALLBACK_PREFIXES: [&str; 2] = ["flatpak-builder-", "flatpak-"];

/// Length of the hex digest fragment kept in derived keys
const KEY_HASH_LEN: usize = 20;

/// Derive a cache key from manifest bytes.
///
/// Deterministic: same bytes yield the same key, run after run, machine
/// after machine.
pub fn derive_key(manifest_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(manifest_bytes);
    let digest = hasher.finalize();

    // 20 hex chars = first 10 digest bytes
    let hash = hex::encode(&digest[..KEY_HASH_LEN / 2]);
    format!("{KEY_PREFIX}{hash}")
}

/// Resolve the cache key: a non-empty caller-supplied key wins, otherwise
/// derive one from the manifest bytes.
pub fn resolve_key(explicit: Option<&str>, manifest_bytes: &[u8]) -> String {
    match explicit.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => key.to_string(),
        None => derive_key(manifest_bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_deterministic() {
        let a = derive_key(b"app-id: org.example.App\n");
        let b = derive_key(b"app-id: org.example.App\n");
        assert_eq!(a, b);
    }

    #[test]
    fn derive_key_shape() {
        let key = derive_key(b"content");
        assert!(key.starts_with(KEY_PREFIX));
        let hash = &key[KEY_PREFIX.len()..];
        assert_eq!(hash.len(), KEY_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash.to_lowercase());
    }

    #[test]
    fn derive_key_known_vector() {
        // sha256("") = e3b0c44298fc1c149afb...
        assert_eq!(derive_key(b""), "flatpak-builder-e3b0c44298fc1c149afb");
    }

    #[test]
    fn any_byte_change_changes_key() {
        let a = derive_key(b"app-id: org.example.App\n");
        let b = derive_key(b"app-id: org.example.App \n");
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_key_wins() {
        assert_eq!(resolve_key(Some("my-key"), b"bytes"), "my-key");
    }

    #[test]
    fn empty_explicit_key_falls_back_to_derived() {
        let derived = derive_key(b"bytes");
        assert_eq!(resolve_key(Some(""), b"bytes"), derived);
        assert_eq!(resolve_key(Some("   "), b"bytes"), derived);
        assert_eq!(resolve_key(None, b"bytes"), derived);
    }

    #[test]
    fn fallback_prefixes_most_specific_first() {
        assert_eq!(FALLBACK_PREFIXES, ["flatpak-builder-", "flatpak-"]);
        assert!(FALLBACK_PREFIXES[0].starts_with(FALLBACK_PREFIXES[1]));
    }
}
