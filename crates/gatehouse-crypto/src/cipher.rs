//! AES-256-GCM implementation of `SecretCipher`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use gatehouse_core::crypto::{CryptoValue, SecretCipher};
use gatehouse_core::error::DomainError;

use crate::keyring::{KEY_LEN, Keyring};

/// Algorithm identifier recorded in every envelope this cipher produces.
pub const ALGORITHM: &str = "aes-256-gcm";

const NONCE_LEN: usize = 12;

/// Seals secrets with AES-256-GCM under the keyring's active key.
///
/// The envelope's ciphertext is the random 96-bit nonce followed by the
/// sealed bytes.
#[derive(Debug, Clone)]
pub struct AesGcmCipher {
    keyring: Keyring,
}

impl AesGcmCipher {
    /// Creates a cipher over `keyring`.
    #[must_use]
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring }
    }

    /// The keyring in use.
    #[must_use]
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }
}

fn cipher_for(key: &[u8; KEY_LEN]) -> Result<Aes256Gcm, DomainError> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|e| DomainError::Encryption(format!("failed to create cipher: {e}")))
}

impl SecretCipher for AesGcmCipher {
    fn algorithm(&self) -> &str {
        ALGORITHM
    }

    fn encryption_key_id(&self) -> &str {
        self.keyring.active_key_id()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<CryptoValue, DomainError> {
        let key = self.keyring.active_key().ok_or_else(|| {
            DomainError::Encryption(format!(
                "active key {} missing from keyring",
                self.keyring.active_key_id()
            ))
        })?;
        let cipher = cipher_for(key)?;

        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| DomainError::Encryption(format!("encryption failed: {e}")))?;

        let mut crypted = Vec::with_capacity(NONCE_LEN + sealed.len());
        crypted.extend_from_slice(&nonce_bytes);
        crypted.extend_from_slice(&sealed);

        Ok(CryptoValue {
            algorithm: ALGORITHM.to_owned(),
            key_id: self.keyring.active_key_id().to_owned(),
            crypted,
        })
    }

    fn decrypt(&self, value: &CryptoValue) -> Result<Vec<u8>, DomainError> {
        if value.algorithm != ALGORITHM {
            return Err(DomainError::Encryption(format!(
                "unsupported algorithm {}",
                value.algorithm
            )));
        }
        let key = self
            .keyring
            .key(&value.key_id)
            .ok_or_else(|| DomainError::Encryption(format!("unknown key {}", value.key_id)))?;
        if value.crypted.len() < NONCE_LEN {
            return Err(DomainError::Encryption("ciphertext too short".to_owned()));
        }
        let (nonce_bytes, sealed) = value.crypted.split_at(NONCE_LEN);

        cipher_for(key)?
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|e| DomainError::Encryption(format!("decryption failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn keyring(active: &str) -> Keyring {
        let keys = BTreeMap::from([
            ("k1".to_owned(), [1u8; KEY_LEN]),
            ("k2".to_owned(), [2u8; KEY_LEN]),
        ]);
        Keyring::new(keys, active).unwrap()
    }

    #[test]
    fn test_encrypt_produces_envelope_tagged_with_algorithm_and_key() {
        // Arrange
        let cipher = AesGcmCipher::new(keyring("k1"));

        // Act
        let value = cipher.encrypt(b"bind-password").unwrap();

        // Assert
        assert_eq!(value.algorithm, ALGORITHM);
        assert_eq!(value.key_id, "k1");
        assert_ne!(&value.crypted[NONCE_LEN..], b"bind-password");
        assert_eq!(cipher.decrypt(&value).unwrap(), b"bind-password");
    }

    #[test]
    fn test_same_plaintext_encrypts_differently_each_time() {
        let cipher = AesGcmCipher::new(keyring("k1"));

        let first = cipher.encrypt(b"secret").unwrap();
        let second = cipher.encrypt(b"secret").unwrap();

        assert_ne!(first.crypted, second.crypted);
    }

    #[test]
    fn test_values_sealed_before_rotation_stay_readable() {
        // Arrange
        let before = AesGcmCipher::new(keyring("k1"));
        let sealed = before.encrypt(b"old secret").unwrap();

        // Act
        let after = AesGcmCipher::new(keyring("k2"));

        // Assert
        assert_eq!(after.encryption_key_id(), "k2");
        assert_eq!(after.decrypt(&sealed).unwrap(), b"old secret");
        assert_eq!(after.encrypt(b"new secret").unwrap().key_id, "k2");
    }

    #[test]
    fn test_decrypt_rejects_unknown_key_and_tampering() {
        let cipher = AesGcmCipher::new(keyring("k1"));
        let sealed = cipher.encrypt(b"secret").unwrap();

        let mut unknown = sealed.clone();
        unknown.key_id = "k9".into();
        let mut tampered = sealed.clone();
        if let Some(last) = tampered.crypted.last_mut() {
            *last ^= 0xff;
        }
        let mut foreign = sealed.clone();
        foreign.algorithm = "enc".into();

        assert!(matches!(
            cipher.decrypt(&unknown),
            Err(DomainError::Encryption(_))
        ));
        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(DomainError::Encryption(_))
        ));
        assert!(matches!(
            cipher.decrypt(&foreign),
            Err(DomainError::Encryption(_))
        ));
    }
}
