// Hub Chain Connector
// Copyright (C) 2019 The Hub Chain Connector contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Loads key pairs from password protected keystore files.
//!
//! Decrypting the key material is left to a [KeyDecryptor] supplied by the caller. This module
//! only reads the file, hands the encrypted section to the decryptor and turns the resulting
//! seed into a key pair.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Error as IOError;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

use hub_core::{address_of, ed25519, Address, CryptoPair as _};

/// Error returned by a [KeyDecryptor].
pub type DecryptionError = Box<dyn std::error::Error + Send + Sync>;

/// Decrypts the key material of a keystore file.
pub trait KeyDecryptor {
    /// Return the raw private key bytes protected by `password`.
    fn decrypt(&self, crypto: &serde_json::Value, password: &str)
        -> Result<Vec<u8>, DecryptionError>;
}

/// Content of a keystore file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeystoreFile {
    pub version: u32,
    /// Hex encoded address of the key. Checked against the decrypted key if present.
    #[serde(default)]
    pub address: Option<String>,
    /// Encrypted key material. Opaque to this module.
    pub crypto: serde_json::Value,
}

#[derive(Debug, ThisError)]
pub enum Error {
    /// Cannot read the keystore file
    #[error("Cannot read keystore file '{1}'")]
    CannotRead(#[source] IOError, PathBuf),

    /// The keystore file is not valid JSON or misses fields
    #[error("Malformed keystore file")]
    Deserialization(#[from] serde_json::Error),

    /// The decryptor rejected the password or the key material
    #[error("Failed to decrypt the keystore")]
    Decryption(#[source] DecryptionError),

    /// The decrypted bytes are not a valid private key
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The decrypted key does not belong to the address stored in the file
    #[error("Keystore is for address {expected} but the key belongs to {actual:?}")]
    AddressMismatch { expected: String, actual: Address },
}

/// Read the keystore at `path` and decrypt its key pair with `password`.
pub fn load_key_pair(
    path: &Path,
    password: &str,
    decryptor: &dyn KeyDecryptor,
) -> Result<ed25519::Pair, Error> {
    let file = File::open(path).map_err(|err| Error::CannotRead(err, path.to_path_buf()))?;
    let keystore: KeystoreFile = serde_json::from_reader(&file)?;
    key_pair_from_keystore(&keystore, password, decryptor)
}

pub fn key_pair_from_keystore(
    keystore: &KeystoreFile,
    password: &str,
    decryptor: &dyn KeyDecryptor,
) -> Result<ed25519::Pair, Error> {
    let secret = decryptor
        .decrypt(&keystore.crypto, password)
        .map_err(Error::Decryption)?;
    let key_pair = ed25519::Pair::from_seed_slice(&secret)
        .map_err(|err| Error::InvalidKey(format!("{:?}", err)))?;

    if let Some(expected) = &keystore.address {
        let actual = address_of(&key_pair.public());
        if !address_matches(expected, &actual) {
            return Err(Error::AddressMismatch {
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(key_pair)
}

fn address_matches(expected: &str, actual: &Address) -> bool {
    let expected = expected.trim_start_matches("0x");
    hex::decode(expected)
        .map(|bytes| bytes.as_slice() == actual.as_bytes())
        .unwrap_or(false)
}
