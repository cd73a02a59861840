//! Bearer tokens held in configuration
//!
//! The ledger gateway and the NER service both authenticate with a bearer
//! token. Tokens are read from TOML or `DEID_*` overrides into a
//! [`SecretString`]: the value is wiped from memory on drop, never shows up in
//! `Debug` output, and is never serialized back out of the configuration.
//! The only way to read it is [`SecretValue::bearer`], at the moment a request
//! header is built.
//!
//! ```rust
//! use deid_ledger::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("ledger-token".to_string());
//! assert_eq!(token.expose_secret().bearer(), "Bearer ledger-token");
//! assert!(!format!("{token:?}").contains("ledger-token"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use serde::Deserialize;
use zeroize::Zeroize;

/// Token text, zeroized when dropped
#[derive(Clone, Deserialize, Zeroize)]
#[serde(transparent)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl SecretValue {
    /// `Authorization` header value for this token
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Whether the token is blank
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Bearer token as stored in configuration
pub type SecretString = Secret<SecretValue>;

/// Wrap a token read from the environment
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_bearer_header() {
        let token = secret_string("tok-123".to_string());
        assert_eq!(token.expose_secret().bearer(), "Bearer tok-123");
    }

    #[test]
    fn test_debug_never_shows_token() {
        let token = secret_string("sensitive-data".to_string());
        let debug_output = format!("{token:?}");
        assert!(!debug_output.contains("sensitive-data"));
        assert!(debug_output.contains("REDACTED"));
    }

    #[test]
    fn test_blank_token() {
        assert!(secret_string("   ".to_string()).expose_secret().is_blank());
        assert!(!secret_string("tok".to_string()).expose_secret().is_blank());
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Section {
            api_key: SecretString,
        }

        let section: Section = toml::from_str(r#"api_key = "from-file""#).unwrap();
        assert_eq!(section.api_key.expose_secret().bearer(), "Bearer from-file");
    }
}
