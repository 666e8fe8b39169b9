//! Gatehouse Crypto: secret-at-rest encryption.
//!
//! Provides [`AesGcmCipher`], the production [`SecretCipher`] used to seal
//! identity-provider secrets before they enter an event.
//!
//! [`SecretCipher`]: gatehouse_core::crypto::SecretCipher

mod cipher;
mod keyring;

pub use cipher::{ALGORITHM, AesGcmCipher};
pub use keyring::{KEY_LEN, Keyring, KeyringError};
