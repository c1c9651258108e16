//! Secure credential handling using the secrecy crate
//!
//! Client secrets live in `Secret<SecretValue>` so they are zeroed on drop,
//! redacted from `Debug` output, and only readable through `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use nimbus::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let client_secret = secret_string("s3cr3t".to_string());
//! assert_eq!(client_secret.expose_secret().as_ref(), "s3cr3t");
//! assert!(!format!("{client_secret:?}").contains("s3cr3t"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype that satisfies the `secrecy` marker traits
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    /// Check if the secret value is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A zeroize-on-drop, debug-redacted string
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("client-secret".to_string());
        assert_eq!(secret.expose_secret(), "client-secret");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-data".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-data"));
    }

    #[test]
    fn test_secret_blank() {
        assert!(secret_string("   ".to_string()).expose_secret().is_blank());
        assert!(!secret_string("x".to_string()).expose_secret().is_blank());
    }

    #[test]
    fn test_secret_deserialize() {
        #[derive(Deserialize)]
        struct Identity {
            client_secret: SecretString,
        }

        let identity: Identity = toml::from_str("client_secret = \"abc123\"").unwrap();
        assert_eq!(identity.client_secret.expose_secret(), "abc123");
    }
}
