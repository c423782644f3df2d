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

//! Test account creation from keys and keystore files.
use hub_client::*;
use hub_test_utils::*;

#[async_std::test]
async fn account_nonce_is_initialized_from_ledger() {
    let (client, emulator) = Client::new_emulator();
    let key_pair = key_pair_from_string(random_alnum_string(8));
    let account = client.create_account_from_key(key_pair.clone()).await.unwrap();
    emulator.mint(&account.address(), FUNDING);
    for _ in 0..3 {
        submit_ok(&client, &account, TransactionRequest::transfer(random_address(), 1)).await;
    }

    let reloaded = client.create_account_from_key(key_pair).await.unwrap();

    assert_eq!(reloaded.address(), account.address());
    assert_eq!(reloaded.nonce(), 3);
    submit_ok(&client, &reloaded, TransactionRequest::transfer(random_address(), 1)).await;
}

#[async_std::test]
async fn account_from_keystore() {
    let (client, _emulator) = Client::new_emulator();
    let seed = [42u8; 32];
    let path = write_keystore(&seed);
    let decryptor = PlainDecryptor {
        password: "hunter2".to_string(),
    };

    let account = client
        .create_account_from_keystore(&path, "hunter2", &decryptor)
        .await
        .unwrap();

    assert_eq!(
        account.public(),
        ed25519::Pair::from_seed(&seed).public()
    );
    assert_eq!(account.nonce(), 0);
    std::fs::remove_file(path).unwrap();
}

#[async_std::test]
async fn keystore_with_wrong_password() {
    let (client, _emulator) = Client::new_emulator();
    let path = write_keystore(&[1u8; 32]);
    let decryptor = PlainDecryptor {
        password: "hunter2".to_string(),
    };

    let result = client
        .create_account_from_keystore(&path, "guess", &decryptor)
        .await;

    assert!(matches!(
        result,
        Err(Error::Keystore(keystore::Error::Decryption(_)))
    ));
    std::fs::remove_file(path).unwrap();
}
