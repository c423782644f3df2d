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

//! Delivery of new blocks to deferreds and watchers.
//!
//! The [dispatch] task consumes the block stream of a backend. For every receipt in a block it
//! completes the pending [crate::TxDeferred] and fires the transaction listener, then it calls all
//! block watchers with the block.
use futures::stream::{Stream, StreamExt as _};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::deferred::DeferredRegistry;
use hub_core::{Block, Receipt, TxHash};

pub type BlockCallback = Arc<dyn Fn(&Block) + Send + Sync>;

pub type TransactionListener = Box<dyn FnOnce(&Receipt) + Send>;

/// Registered block watchers and transaction listeners.
#[derive(Default)]
pub struct Watchers {
    blocks: Mutex<Vec<BlockCallback>>,
    transactions: Mutex<HashMap<TxHash, Vec<TransactionListener>>>,
}

impl Watchers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block_watcher(&self, callback: BlockCallback) {
        lock(&self.blocks).push(callback);
    }

    /// Call `listener` once with the receipt of the transaction.
    pub fn add_transaction_listener(&self, tx_hash: TxHash, listener: TransactionListener) {
        lock(&self.transactions)
            .entry(tx_hash)
            .or_default()
            .push(listener);
    }

    /// Fire and remove the listeners registered for the receipt's transaction.
    ///
    /// Returns `true` if any listener was registered.
    pub fn notify_receipt(&self, receipt: &Receipt) -> bool {
        let listeners = lock(&self.transactions).remove(&receipt.transaction_hash);
        match listeners {
            Some(listeners) => {
                for listener in listeners {
                    listener(receipt);
                }
                true
            }
            None => false,
        }
    }

    pub fn notify_block(&self, block: &Block) {
        // Callbacks may register further watchers.
        let callbacks = lock(&self.blocks).clone();
        for callback in callbacks {
            callback(block);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deliver the receipts and blocks from `blocks` until the stream ends.
pub async fn dispatch(
    mut blocks: impl Stream<Item = Block> + Unpin,
    deferreds: Arc<DeferredRegistry>,
    watchers: Arc<Watchers>,
) {
    while let Some(block) = blocks.next().await {
        deliver(&block, &deferreds, &watchers);
    }
    log::debug!("Block stream ended");
}

/// Deliver a single block. Receipts nobody waits for are ignored.
pub fn deliver(block: &Block, deferreds: &DeferredRegistry, watchers: &Watchers) {
    for receipt in &block.receipts {
        let completed = deferreds.complete(receipt).is_some();
        let notified = watchers.notify_receipt(receipt);
        if !completed && !notified {
            log::debug!(
                "Ignoring receipt for untracked transaction {:?}",
                receipt.transaction_hash
            );
        }
    }
    watchers.notify_block(block);
}

#[cfg(test)]
mod test {
    use super::*;
    use futures::executor::block_on;
    use hub_core::{BlockHash, H256, ReceiptStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn block(number: u64, tx_hashes: &[TxHash]) -> Block {
        let parent_hash = BlockHash::zero();
        let hash = Block::compute_hash(number, &parent_hash, tx_hashes);
        Block {
            number,
            hash,
            parent_hash,
            transactions: tx_hashes.to_vec(),
            receipts: tx_hashes
                .iter()
                .map(|tx_hash| Receipt {
                    transaction_hash: *tx_hash,
                    block_number: number,
                    block_hash: hash,
                    status: ReceiptStatus::Success,
                    contract_address: None,
                    gas_used: 21_000,
                })
                .collect(),
        }
    }

    #[test]
    fn listener_fires_once() {
        let watchers = Watchers::new();
        let deferreds = DeferredRegistry::new();
        let tx_hash = H256::random();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_ = calls.clone();
        watchers.add_transaction_listener(
            tx_hash,
            Box::new(move |_receipt| {
                calls_.fetch_add(1, Ordering::SeqCst);
            }),
        );

        deliver(&block(1, &[tx_hash]), &deferreds, &watchers);
        deliver(&block(2, &[tx_hash]), &deferreds, &watchers);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_resolves_deferreds_and_notifies_block_watchers() {
        let watchers = Arc::new(Watchers::new());
        let deferreds = Arc::new(DeferredRegistry::new());
        let tx_hash = H256::random();
        let deferred = deferreds.register(tx_hash).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_ = seen.clone();
        watchers.add_block_watcher(Arc::new(move |block: &Block| {
            seen_.lock().unwrap().push(block.number)
        }));

        let blocks = futures::stream::iter(vec![block(1, &[]), block(2, &[tx_hash])]);
        block_on(dispatch(blocks, deferreds.clone(), watchers));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(block_on(deferred).unwrap().block_number, 2);
        assert_eq!(deferreds.pending_count(), 0);
    }
}
