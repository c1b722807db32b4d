// src/core/hash.rs

use crate::models::RequirementSet;

const HASH_TRUNCATE_LENGTH: usize = 16; // 16 bytes = 32 hex characters

/// Calculates the fingerprint of a requirement set.
///
/// The digest covers every (trimmed) requirement in the order given, followed by the
/// post-install command. Each item is terminated by a newline so that `["ab", "c"]` and
/// `["a", "bc"]` do not collide. Blank items and a missing post-install contribute nothing,
/// so an empty set hashes the empty byte sequence.
///
/// The `dir` override is not part of the fingerprint.
pub fn fingerprint(set: &RequirementSet) -> String {
    let mut hasher = blake3::Hasher::new();
    let items = set
        .requirements
        .iter()
        .map(String::as_str)
        .chain(set.post_install.as_deref());
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        hasher.update(item.as_bytes());
        hasher.update(b"\n");
    }
    let hash = hasher.finalize();
    hex::encode(hash.as_bytes().get(..HASH_TRUNCATE_LENGTH).unwrap_or_default())
}
