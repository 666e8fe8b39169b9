//! Secret envelope and the cipher contract.
//!
//! Sensitive configuration values are encrypted at the point of mutation and
//! only ever stored as a [`CryptoValue`]. The envelope keeps the algorithm and
//! key identifiers next to the ciphertext so historical events stay
//! decryptable after a key rotation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Ciphertext plus the identifiers needed to decrypt it later.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoValue {
    /// Algorithm that produced `crypted`.
    pub algorithm: String,
    /// Identifier of the key used.
    pub key_id: String,
    /// The ciphertext, base64 encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub crypted: Vec<u8>,
}

impl fmt::Debug for CryptoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoValue")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .field("crypted", &format_args!("<{} bytes>", self.crypted.len()))
            .finish()
    }
}

/// Encrypts and decrypts secret values.
///
/// Implementations are stateless or internally synchronized; calls never
/// suspend.
pub trait SecretCipher: Send + Sync {
    /// Name of the algorithm used for new encryptions.
    fn algorithm(&self) -> &str;

    /// Identifier of the key used for new encryptions.
    fn encryption_key_id(&self) -> &str;

    /// Encrypts `plaintext` with the active key.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Encryption` if the cipher fails.
    fn encrypt(&self, plaintext: &[u8]) -> Result<CryptoValue, DomainError>;

    /// Decrypts an envelope using the key it names.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Encryption` if the key is unknown, the algorithm
    /// does not match, or authentication fails.
    fn decrypt(&self, value: &CryptoValue) -> Result<Vec<u8>, DomainError>;
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_value_serializes_ciphertext_as_base64() {
        let value = CryptoValue {
            algorithm: "enc".into(),
            key_id: "id".into(),
            crypted: b"password".to_vec(),
        };

        let json = serde_json::to_value(&value).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "algorithm": "enc",
                "keyId": "id",
                "crypted": "cGFzc3dvcmQ=",
            })
        );
        let back: CryptoValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_debug_does_not_leak_ciphertext() {
        let value = CryptoValue {
            algorithm: "enc".into(),
            key_id: "id".into(),
            crypted: b"password".to_vec(),
        };

        let rendered = format!("{value:?}");

        assert!(rendered.contains("<8 bytes>"));
        assert!(!rendered.contains("112"));
    }
}
