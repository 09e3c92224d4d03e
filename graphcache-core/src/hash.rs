//! Deterministic short identifiers for cache keys.
//!
//! Every key the cache persists under is derived from a string (query text,
//! graph URI, sorted member set) through the same digest: `"qc-"` plus the
//! first 30 hex chars of SHA-256. The prefix keeps cache keys from colliding
//! with anything else sharing the KV namespace, and the truncation keeps keys
//! at a fixed 33 chars.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Namespace prefix carried by every derived key.
pub const ID_PREFIX: &str = "qc-";

/// Number of hex digits kept from the digest.
const DIGEST_CHARS: usize = 30;

/// Derive the short ID for a string.
///
/// Pure function: the same input always yields the same 33-char key.
pub fn short_id(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex = hex::encode(digest);
    format!("{}{}", ID_PREFIX, &hex[..DIGEST_CHARS])
}

/// Derive the content-addressed ID of a related group from its member set.
///
/// `BTreeSet` serializes in sorted order, so the JSON form is canonical and
/// identical member sets always produce identical group IDs.
pub fn related_group_id(members: &BTreeSet<String>) -> String {
    let canonical =
        serde_json::to_string(members).expect("BTreeSet<String> always serializes to JSON");
    short_id(&canonical)
}
