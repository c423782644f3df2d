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

//! Miscellaneous helpers used throughout hub client tests.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::PathBuf;

use hub_client::keystore::{DecryptionError, KeyDecryptor, KeystoreFile};
use hub_client::*;

/// Balance minted for accounts created by [funded_account].
pub const FUNDING: Balance = 1 << 60;

/// Submit a transaction and wait for it to be included.
///
/// Panics if submission errors or the transaction failed.
pub async fn submit_ok(
    client: &Client,
    account: &Account,
    request: TransactionRequest,
) -> Receipt {
    let receipt = client
        .submit_transaction(account, request)
        .await
        .unwrap()
        .await
        .unwrap();
    assert!(receipt.is_success(), "Transaction failed: {:?}", receipt);
    receipt
}

pub fn key_pair_from_string(value: impl AsRef<str>) -> ed25519::Pair {
    ed25519::Pair::from_string(format!("//{}", value.as_ref()).as_str(), None).unwrap()
}

/// Create an account with a random key and equip it with [FUNDING].
pub async fn funded_account(client: &Client, emulator: &Emulator) -> Account {
    let account = client.create_account().await.unwrap();
    emulator.mint(&account.address(), FUNDING);
    account
}

pub fn random_alnum_string(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .collect::<String>()
}

pub fn random_balance() -> Balance {
    rand::thread_rng().gen_range(1, 10_000)
}

pub fn random_address() -> Address {
    Address::from(rand::thread_rng().gen::<[u8; 20]>())
}

/// Artifact of a challenge contract without constructor and with random code.
pub fn challenge_artifact() -> ContractArtifact {
    ContractArtifact {
        code: random_alnum_string(32).into_bytes(),
        interface: ContractInterface {
            name: "Challenge".to_string(),
            constructor: None,
            functions: vec!["challenge".to_string(), "answer".to_string()],
        },
    }
}

/// Artifact of a service contract whose constructor takes the challenge address and bytes.
pub fn service_artifact() -> ContractArtifact {
    ContractArtifact {
        code: random_alnum_string(32).into_bytes(),
        interface: ContractInterface {
            name: "Service".to_string(),
            constructor: Some(vec![ParamKind::Address, ParamKind::Bytes]),
            functions: vec!["deposit".to_string(), "withdraw".to_string()],
        },
    }
}

/// Decryptor for keystores written by [write_keystore]. The seed is stored in plain hex.
pub struct PlainDecryptor {
    pub password: String,
}

impl KeyDecryptor for PlainDecryptor {
    fn decrypt(
        &self,
        crypto: &serde_json::Value,
        password: &str,
    ) -> Result<Vec<u8>, DecryptionError> {
        if password != self.password {
            return Err("wrong password".into());
        }
        let seed = crypto["seed"].as_str().ok_or("missing seed")?;
        Ok(hex::decode(seed)?)
    }
}

/// Write a keystore for `seed` to a fresh temporary file and return its path.
pub fn write_keystore(seed: &[u8; 32]) -> PathBuf {
    let key_pair = ed25519::Pair::from_seed(seed);
    let keystore = KeystoreFile {
        version: 1,
        address: Some(format!("0x{}", hex::encode(address_of(&key_pair.public())))),
        crypto: serde_json::json!({ "seed": hex::encode(seed) }),
    };
    let path =
        std::env::temp_dir().join(format!("hub-keystore-{}.json", random_alnum_string(12)));
    std::fs::write(&path, serde_json::to_vec(&keystore).unwrap()).unwrap();
    path
}
