//! Versioned key material.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Errors raised while assembling a keyring.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyringError {
    /// No key was configured.
    #[error("keyring is empty")]
    Empty,

    /// An entry is not of the form `keyId:base64key`.
    #[error("malformed key entry at position {0}, expected keyId:base64key")]
    MalformedEntry(usize),

    /// A key is not valid base64.
    #[error("key {0} is not valid base64")]
    InvalidEncoding(String),

    /// A key does not have the AES-256 length.
    #[error("key {key_id} must be {KEY_LEN} bytes, got {len}")]
    InvalidLength {
        /// The offending key.
        key_id: String,
        /// Its decoded length.
        len: usize,
    },

    /// The same key id appears twice.
    #[error("duplicate key id {0}")]
    DuplicateKeyId(String),

    /// The active key id names no configured key.
    #[error("active key {0} is not in the keyring")]
    UnknownActiveKey(String),
}

/// All keys a cipher may decrypt with, plus the one it encrypts with.
///
/// Retired keys stay in the ring so events sealed before a rotation remain
/// readable.
#[derive(Clone)]
pub struct Keyring {
    keys: BTreeMap<String, [u8; KEY_LEN]>,
    active_key_id: String,
}

impl Keyring {
    /// Builds a keyring from explicit keys.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::Empty` if `keys` is empty and
    /// `KeyringError::UnknownActiveKey` if `active_key_id` is not among them.
    pub fn new(
        keys: BTreeMap<String, [u8; KEY_LEN]>,
        active_key_id: &str,
    ) -> Result<Self, KeyringError> {
        if keys.is_empty() {
            return Err(KeyringError::Empty);
        }
        if !keys.contains_key(active_key_id) {
            return Err(KeyringError::UnknownActiveKey(active_key_id.to_owned()));
        }
        Ok(Self {
            keys,
            active_key_id: active_key_id.to_owned(),
        })
    }

    /// Parses `keyId:base64key[,keyId:base64key...]`.
    ///
    /// The active key defaults to the first entry.
    ///
    /// # Errors
    ///
    /// Returns a `KeyringError` describing the first bad entry.
    pub fn parse(spec: &str, active_key_id: Option<&str>) -> Result<Self, KeyringError> {
        let mut keys = BTreeMap::new();
        let mut first = None;
        for (position, entry) in spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .enumerate()
        {
            let (key_id, encoded) = entry
                .split_once(':')
                .filter(|(key_id, encoded)| !key_id.is_empty() && !encoded.is_empty())
                .ok_or(KeyringError::MalformedEntry(position))?;
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|_| KeyringError::InvalidEncoding(key_id.to_owned()))?;
            let key: [u8; KEY_LEN] =
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| KeyringError::InvalidLength {
                        key_id: key_id.to_owned(),
                        len: bytes.len(),
                    })?;
            if keys.insert(key_id.to_owned(), key).is_some() {
                return Err(KeyringError::DuplicateKeyId(key_id.to_owned()));
            }
            first.get_or_insert_with(|| key_id.to_owned());
        }
        let active = match (active_key_id, first) {
            (Some(active), _) => active.to_owned(),
            (None, Some(first)) => first,
            (None, None) => return Err(KeyringError::Empty),
        };
        Self::new(keys, &active)
    }

    /// Identifier of the key used for new encryptions.
    #[must_use]
    pub fn active_key_id(&self) -> &str {
        &self.active_key_id
    }

    /// The active key.
    pub(crate) fn active_key(&self) -> Option<&[u8; KEY_LEN]> {
        self.keys.get(&self.active_key_id)
    }

    /// Looks up a key by id.
    pub(crate) fn key(&self, key_id: &str) -> Option<&[u8; KEY_LEN]> {
        self.keys.get(key_id)
    }

    /// Short SHA-256 fingerprints of every key, for operator logs.
    #[must_use]
    pub fn fingerprints(&self) -> Vec<(String, String)> {
        self.keys
            .iter()
            .map(|(key_id, key)| {
                let digest = Sha256::digest(key);
                let fingerprint: String =
                    digest[..8].iter().map(|b| format!("{b:02x}")).collect();
                (key_id.clone(), fingerprint)
            })
            .collect()
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .field("active_key_id", &self.active_key_id)
            .finish()
    }
}
