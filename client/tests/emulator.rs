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

//! Test transaction submission and state queries against the emulator.
use futures::channel::{mpsc, oneshot};
use futures::StreamExt as _;
use std::sync::Arc;
use std::time::Duration;

use hub_client::backend::BASE_GAS;
use hub_client::*;
use hub_test_utils::*;

#[async_std::test]
async fn transfer() {
    let _ = env_logger::try_init();
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;
    let recipient = random_address();
    let amount = random_balance();

    let receipt = submit_ok(&client, &alice, TransactionRequest::transfer(recipient, amount)).await;

    assert_eq!(receipt.block_number, 1);
    assert_eq!(receipt.gas_used, BASE_GAS);
    assert_eq!(client.balance(&recipient).await.unwrap(), amount);
    assert_eq!(
        client.balance(&alice.address()).await.unwrap(),
        FUNDING - amount - Balance::from(BASE_GAS)
    );
    assert_eq!(client.nonce(&alice.address()).await.unwrap(), 1);
    assert_eq!(alice.nonce(), 1);
}

#[async_std::test]
async fn find_submitted_transaction() {
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;

    let deferred = client
        .submit_transaction(&alice, TransactionRequest::transfer(random_address(), 1))
        .await
        .unwrap();
    let tx_hash = deferred.tx_hash();
    let receipt = deferred.await.unwrap();

    let transaction = client.find_transaction(&tx_hash).await.unwrap().unwrap();
    assert_eq!(transaction.hash(), tx_hash);
    assert_eq!(transaction.transaction.from, alice.address());
    assert_eq!(client.receipt(&tx_hash).await.unwrap(), Some(receipt.clone()));

    let block = client.block(receipt.block_number).await.unwrap().unwrap();
    assert_eq!(block.hash, receipt.block_hash);
    assert_eq!(block.transactions, vec![tx_hash]);
    assert_eq!(client.block_number().await.unwrap(), receipt.block_number);

    assert!(client.find_transaction(&TxHash::random()).await.unwrap().is_none());
}

#[async_std::test]
async fn concurrent_submissions_use_distinct_nonces() {
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;
    let count = 20;

    let submissions = (0..count).map(|_| {
        let client = client.clone();
        let alice = alice.clone();
        async move {
            client
                .submit_transaction(&alice, TransactionRequest::transfer(random_address(), 1))
                .await
                .unwrap()
                .await
                .unwrap()
        }
    });
    let receipts = futures::future::join_all(submissions).await;

    assert!(receipts.iter().all(Receipt::is_success));
    let mut nonces = Vec::new();
    for receipt in &receipts {
        let transaction = client
            .find_transaction(&receipt.transaction_hash)
            .await
            .unwrap()
            .unwrap();
        nonces.push(transaction.transaction.nonce);
    }
    nonces.sort();
    assert_eq!(nonces, (0..count).collect::<Vec<_>>());
    assert_eq!(alice.nonce(), count);
    assert_eq!(client.nonce(&alice.address()).await.unwrap(), count);
}

#[async_std::test]
async fn stale_nonce_is_rejected() {
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;
    submit_ok(&client, &alice, TransactionRequest::transfer(random_address(), 1)).await;

    let stale = TransactionRequest::transfer(random_address(), 1)
        .into_transaction(alice.address(), 0, client.config())
        .sign(alice.key_pair());
    let result = client.submit_signed_transaction(stale).await;

    match result {
        Err(Error::InvalidNonce {
            account,
            expected,
            actual,
        }) => {
            assert_eq!(account, alice.address());
            assert_eq!(expected, 1);
            assert_eq!(actual, 0);
        }
        other => panic!("Unexpected result {:?}", other),
    }
    assert_eq!(client.deferreds().pending_count(), 0);
}

#[async_std::test]
async fn invalid_nonce_resyncs_account() {
    let (client, emulator) = Client::new_emulator();
    let key_pair = key_pair_from_string(random_alnum_string(8));
    let account = Account::new(key_pair, 3);
    emulator.mint(&account.address(), FUNDING);

    let result = client
        .submit_transaction(&account, TransactionRequest::transfer(random_address(), 1))
        .await;

    match result {
        Err(Error::InvalidNonce { expected, actual, .. }) => {
            assert_eq!(expected, 0);
            assert_eq!(actual, 3);
        }
        other => panic!("Unexpected result {:?}", other),
    }
    assert_eq!(account.nonce(), 0);
    assert_eq!(client.deferreds().pending_count(), 0);

    let receipt = submit_ok(
        &client,
        &account,
        TransactionRequest::transfer(random_address(), 1),
    )
    .await;
    assert_eq!(receipt.status, ReceiptStatus::Success);
    assert_eq!(account.nonce(), 1);
}

#[async_std::test]
async fn rejected_submission_returns_nonce() {
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;
    let request = TransactionRequest::transfer(random_address(), 1);
    let tx_hash = request
        .clone()
        .into_transaction(alice.address(), 0, client.config())
        .sign(alice.key_pair())
        .hash();
    client.deferreds().register(tx_hash).unwrap();

    let result = client.submit_transaction(&alice, request).await;

    assert!(matches!(result, Err(Error::DuplicateDeferred(hash)) if hash == tx_hash));
    assert_eq!(alice.nonce(), 0);
    assert_eq!(client.nonce(&alice.address()).await.unwrap(), 0);
}

#[async_std::test]
async fn failed_transaction_is_reported_in_receipt() {
    let (client, _emulator) = Client::new_emulator();
    let poor = client.create_account().await.unwrap();

    let receipt = client
        .submit_transaction(&poor, TransactionRequest::transfer(random_address(), 1))
        .await
        .unwrap()
        .await
        .unwrap();

    assert_eq!(
        receipt.status,
        ReceiptStatus::Failed(FailureReason::InsufficientBalance)
    );
    assert_eq!(client.nonce(&poor.address()).await.unwrap(), 1);
}

#[async_std::test]
async fn manual_block_production() {
    let emulator = Emulator::manual();
    let client = Client::new(Arc::new(emulator.clone()), ChainConfig::default());
    let alice = funded_account(&client, &emulator).await;

    let first = client
        .submit_transaction(&alice, TransactionRequest::transfer(random_address(), 1))
        .await
        .unwrap();
    let second = client
        .submit_transaction(&alice, TransactionRequest::transfer(random_address(), 1))
        .await
        .unwrap();
    assert_eq!(emulator.pending_count(), 2);

    let result = first.clone().wait_timeout(Duration::from_millis(50)).await;
    assert!(matches!(result, Err(Error::Timeout(_))));
    assert!(client.deferreds().is_pending(&first.tx_hash()));

    let block = emulator.produce_block();

    let first = first.await.unwrap();
    let second = second.await.unwrap();
    assert_eq!(first.block_number, block.number);
    assert_eq!(second.block_hash, block.hash);
    assert_eq!(client.deferreds().pending_count(), 0);
}

#[async_std::test]
async fn watch_blocks() {
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;
    let (sender, mut blocks) = mpsc::unbounded();
    client.watch_blocks(move |block| {
        let _ = sender.unbounded_send(block.clone());
    });

    let receipt = submit_ok(
        &client,
        &alice,
        TransactionRequest::transfer(random_address(), 1),
    )
    .await;

    let block = blocks.next().await.unwrap();
    assert_eq!(block.number, receipt.block_number);
    assert_eq!(block.receipt(&receipt.transaction_hash), Some(&receipt));
}

#[async_std::test]
async fn watch_transaction() {
    let emulator = Emulator::manual();
    let client = Client::new(Arc::new(emulator.clone()), ChainConfig::default());
    let alice = funded_account(&client, &emulator).await;

    let deferred = client
        .submit_transaction(&alice, TransactionRequest::transfer(random_address(), 1))
        .await
        .unwrap();
    let (sender, receiver) = oneshot::channel();
    client
        .watch_transaction(deferred.tx_hash(), move |receipt| {
            let _ = sender.send(receipt.clone());
        })
        .await
        .unwrap();

    emulator.produce_block();

    let watched = receiver.await.unwrap();
    assert_eq!(watched, deferred.await.unwrap());
}

#[async_std::test]
async fn watch_included_transaction() {
    let (client, emulator) = Client::new_emulator();
    let alice = funded_account(&client, &emulator).await;
    let receipt = submit_ok(
        &client,
        &alice,
        TransactionRequest::transfer(random_address(), 1),
    )
    .await;

    let (sender, receiver) = oneshot::channel();
    client
        .watch_transaction(receipt.transaction_hash, move |receipt| {
            let _ = sender.send(receipt.clone());
        })
        .await
        .unwrap();

    assert_eq!(receiver.await.unwrap(), receipt);
}

#[async_std::test]
async fn genesis_balances_from_config() {
    let address = random_address();
    let config = ChainConfig {
        genesis: vec![config::GenesisAccount {
            address: format!("0x{}", hex::encode(address)),
            balance: 1_000,
        }],
        ..ChainConfig::default()
    };
    let (client, _emulator) = Client::emulator_from_config(config).unwrap();

    assert_eq!(client.balance(&address).await.unwrap(), 1_000);
}
