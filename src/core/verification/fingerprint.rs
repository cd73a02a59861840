//! Content fingerprinting
//!
//! Fingerprints are SHA-256 digests over exact byte content. There is no
//! whitespace, case or Unicode normalization: a trailing newline or a changed
//! letter case produces a different fingerprint. Pre- and post-redaction
//! content go through the same function so fingerprints are comparable across
//! the whole system.

use crate::domain::ContentFingerprint;
use sha2::{Digest, Sha256};

/// Calculate the fingerprint of a text
///
/// # Examples
///
/// ```
/// use deid_ledger::core::verification::fingerprint::fingerprint;
///
/// let fp = fingerprint("Patient John Smith was admitted on October 8, 2025.");
/// assert_eq!(fp.as_str().len(), 64); // SHA-256 produces 64 hex characters
/// ```
pub fn fingerprint(text: &str) -> ContentFingerprint {
    fingerprint_bytes(text.as_bytes())
}

/// Calculate the fingerprint of raw bytes
///
/// Use this for documents read from disk so that the digest covers the file
/// exactly as stored, including any non-UTF-8 content.
pub fn fingerprint_bytes(data: &[u8]) -> ContentFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    ContentFingerprint::from_digest_hex(format!("{result:x}"))
}
