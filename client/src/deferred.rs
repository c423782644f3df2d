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

//! Single resolution handles for submitted transactions.
//!
//! Submitting a transaction [registers](DeferredRegistry::register) a [TxDeferred] for its hash.
//! The event dispatcher [completes](DeferredRegistry::complete) the deferred when the receipt
//! for the hash shows up in a block. A deferred resolves at most once. Receipts for hashes without
//! pending deferred are ignored.
use dashmap::{mapref::entry::Entry, DashMap};
use futures::channel::oneshot;
use futures::future::{FutureExt as _, Shared};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::Error;
use hub_core::{Receipt, TxHash};

/// Handle to the eventual [Receipt] of a submitted transaction.
///
/// Awaiting the deferred yields the receipt once the transaction was included in a block. There
/// is no built-in timeout. Use [TxDeferred::wait_timeout] to bound the wait. Clones resolve
/// together.
#[derive(Clone)]
pub struct TxDeferred {
    tx_hash: TxHash,
    receipt: Shared<oneshot::Receiver<Receipt>>,
}

impl TxDeferred {
    fn new(tx_hash: TxHash) -> (Self, oneshot::Sender<Receipt>) {
        let (sender, receiver) = oneshot::channel();
        let deferred = TxDeferred {
            tx_hash,
            receipt: receiver.shared(),
        };
        (deferred, sender)
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// The receipt if the deferred has been resolved already.
    pub fn receipt(&self) -> Option<Receipt> {
        match self.receipt.peek() {
            Some(Ok(receipt)) => Some(receipt.clone()),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.receipt().is_some()
    }

    /// Wait for the receipt for at most `timeout`.
    ///
    /// Timing out leaves the registry untouched. Clones of this deferred still resolve when the
    /// receipt arrives later.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<Receipt, Error> {
        let tx_hash = self.tx_hash;
        async_std::future::timeout(timeout, self)
            .await
            .map_err(|_| Error::Timeout(tx_hash))?
    }
}

impl Future for TxDeferred {
    type Output = Result<Receipt, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let tx_hash = self.tx_hash;
        Pin::new(&mut self.receipt)
            .poll(cx)
            .map(|result| result.map_err(|_cancelled| Error::DeferredCancelled(tx_hash)))
    }
}

impl std::fmt::Debug for TxDeferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxDeferred")
            .field("tx_hash", &self.tx_hash)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

struct Pending {
    sender: oneshot::Sender<Receipt>,
    deferred: TxDeferred,
}

/// Pending [TxDeferred]s by transaction hash.
///
/// The map is sharded by hash so operations on unrelated hashes rarely contend. No lock is held
/// while a deferred is awaited.
#[derive(Default)]
pub struct DeferredRegistry {
    pending: DashMap<TxHash, Pending>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a pending deferred for `tx_hash`.
    ///
    /// Fails with [Error::DuplicateDeferred] if a deferred for the hash is already pending.
    pub fn register(&self, tx_hash: TxHash) -> Result<TxDeferred, Error> {
        match self.pending.entry(tx_hash) {
            Entry::Occupied(_) => Err(Error::DuplicateDeferred(tx_hash)),
            Entry::Vacant(entry) => {
                let (deferred, sender) = TxDeferred::new(tx_hash);
                entry.insert(Pending {
                    sender,
                    deferred: deferred.clone(),
                });
                Ok(deferred)
            }
        }
    }

    /// Resolve the deferred for the receipt's transaction and remove it from the registry.
    ///
    /// Returns `None` if no deferred is pending for the hash. This happens for transactions this
    /// process never submitted and for receipts that were already delivered.
    pub fn complete(&self, receipt: &Receipt) -> Option<TxDeferred> {
        let (_, pending) = self.pending.remove(&receipt.transaction_hash)?;
        // The receiving side lives in `pending.deferred` and cannot be gone yet.
        let _ = pending.sender.send(receipt.clone());
        log::debug!(
            "Resolved deferred for transaction {:?} in block {}",
            receipt.transaction_hash,
            receipt.block_number
        );
        Some(pending.deferred)
    }

    /// Drop the pending deferred for `tx_hash` without resolving it.
    ///
    /// Awaiting clones of the deferred fail with [Error::DeferredCancelled]. Returns `false` if
    /// nothing was pending.
    pub fn cancel(&self, tx_hash: &TxHash) -> bool {
        self.pending.remove(tx_hash).is_some()
    }

    /// A clone of the pending deferred for `tx_hash`.
    pub fn get(&self, tx_hash: &TxHash) -> Option<TxDeferred> {
        self.pending
            .get(tx_hash)
            .map(|pending| pending.deferred.clone())
    }

    pub fn is_pending(&self, tx_hash: &TxHash) -> bool {
        self.pending.contains_key(tx_hash)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
