//! Content fingerprint newtype
//!
//! A [`ContentFingerprint`] is the lowercase hex SHA-256 digest of exact byte
//! content. Computation lives in [`crate::core::verification::fingerprint`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 digest of exact byte content
///
/// Two fingerprints are equal iff the inputs were byte-identical (up to the
/// collision resistance of SHA-256).
///
/// # Examples
///
/// ```
/// use deid_ledger::domain::fingerprint::ContentFingerprint;
///
/// let hex = "a".repeat(64);
/// let fp = ContentFingerprint::from_hex(&hex).unwrap();
/// assert_eq!(fp.as_str(), hex);
///
/// assert!(ContentFingerprint::from_hex("not-a-digest").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Parse a fingerprint from its hex form
    ///
    /// Only 64 lowercase hex digits are accepted; this is the exact form the
    /// fingerprinter emits, so no normalization happens here.
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        if hex.len() != FINGERPRINT_HEX_LEN {
            return Err(format!(
                "Fingerprint must be {FINGERPRINT_HEX_LEN} hex characters, got {}",
                hex.len()
            ));
        }
        if !hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err("Fingerprint must contain only lowercase hex digits".to_string());
        }
        Ok(Self(hex.to_string()))
    }

    /// Wrap a digest already known to be well-formed
    pub(crate) fn from_digest_hex(hex: String) -> Self {
        Self(hex)
    }

    /// Returns the fingerprint as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentFingerprint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ContentFingerprint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ContentFingerprint> for String {
    fn from(fp: ContentFingerprint) -> Self {
        fp.0
    }
}

impl AsRef<str> for ContentFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_valid() {
        let hex = "0123456789abcdef".repeat(4);
        let fp = ContentFingerprint::from_hex(&hex).unwrap();
        assert_eq!(fp.to_string(), hex);
    }

    #[test]
    fn test_from_hex_rejects_uppercase() {
        let hex = "0123456789ABCDEF".repeat(4);
        assert!(ContentFingerprint::from_hex(&hex).is_err());
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(ContentFingerprint::from_hex("abc").is_err());
        assert!(ContentFingerprint::from_hex(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let ok = format!("\"{}\"", "f".repeat(64));
        assert!(serde_json::from_str::<ContentFingerprint>(&ok).is_ok());
        assert!(serde_json::from_str::<ContentFingerprint>("\"zz\"").is_err());
    }
}
