//! Test ciphers.
//!
//! `MockCipher` does not encrypt: the envelope carries the plaintext bytes
//! under algorithm `enc` and key `id`, so tests can assert on exact payloads.

use gatehouse_core::crypto::{CryptoValue, SecretCipher};
use gatehouse_core::error::DomainError;

/// A transparent cipher for assertions.
#[derive(Debug, Default)]
pub struct MockCipher;

impl MockCipher {
    /// The envelope `encrypt` produces for `plaintext`.
    #[must_use]
    pub fn sealed(plaintext: &str) -> CryptoValue {
        CryptoValue {
            algorithm: "enc".into(),
            key_id: "id".into(),
            crypted: plaintext.as_bytes().to_vec(),
        }
    }
}

impl SecretCipher for MockCipher {
    fn algorithm(&self) -> &str {
        "enc"
    }

    fn encryption_key_id(&self) -> &str {
        "id"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<CryptoValue, DomainError> {
        Ok(CryptoValue {
            algorithm: "enc".into(),
            key_id: "id".into(),
            crypted: plaintext.to_vec(),
        })
    }

    fn decrypt(&self, value: &CryptoValue) -> Result<Vec<u8>, DomainError> {
        Ok(value.crypted.clone())
    }
}

/// A cipher that always fails.
#[derive(Debug, Default)]
pub struct FailingCipher;

impl SecretCipher for FailingCipher {
    fn algorithm(&self) -> &str {
        "enc"
    }

    fn encryption_key_id(&self) -> &str {
        "id"
    }

    fn encrypt(&self, _plaintext: &[u8]) -> Result<CryptoValue, DomainError> {
        Err(DomainError::Encryption("cipher unavailable".into()))
    }

    fn decrypt(&self, _value: &CryptoValue) -> Result<Vec<u8>, DomainError> {
        Err(DomainError::Encryption("cipher unavailable".into()))
    }
}
