//! Cache key derivation
//!
//! Keys are deterministic hashes of the cached operation's input, namespaced
//! by a short prefix so that whole families of entries can be invalidated
//! together.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of arbitrary content
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Key for per-file parsed-command caching
pub fn parsed_commands_key(content_hash: &str) -> String {
    format!("parsed-commands:{content_hash}")
}

/// Key for per-file humanization output caching
pub fn humanized_key(content_hash: &str) -> String {
    format!("humanized:{content_hash}")
}

/// Key for multi-file pattern-analysis caching.
///
/// The set of file hashes is sorted and colon-joined before hashing so the
/// key is independent of input order.
pub fn pattern_analysis_key(file_hashes: &[String]) -> String {
    let mut sorted = file_hashes.to_vec();
    sorted.sort();
    let joined = sorted.join(":");
    format!("pattern-analysis:{}", content_hash(joined.as_bytes()))
}

/// Key for per-image element-analysis caching (bare entity id)
pub fn image_analysis_key(entity_id: &str) -> String {
    format!("image-analysis:{entity_id}")
}

/// Key for the best-effort pattern usage tally
pub fn pattern_usage_key(pattern_id: &str) -> String {
    format!("pattern-usage:{pattern_id}")
}
