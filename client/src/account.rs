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

//! Provides [Account].
use futures::lock::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::nonce::NonceManager;
use hub_core::{address_of, ed25519, AccountId, Address, CryptoPair as _, Nonce};

/// A key pair together with the nonce counter of its on-chain account.
///
/// Clones share the nonce counter so an account can be used from several tasks at once.
#[derive(Clone)]
pub struct Account {
    key_pair: ed25519::Pair,
    address: Address,
    nonces: Arc<NonceManager>,
    submission: Arc<Mutex<()>>,
}

impl Account {
    /// Create an account whose next transaction uses `nonce`.
    ///
    /// Use [crate::ChainConnector::create_account_from_key] to initialize the nonce from the
    /// ledger.
    pub fn new(key_pair: ed25519::Pair, nonce: Nonce) -> Self {
        let address = address_of(&key_pair.public());
        Account {
            key_pair,
            address,
            nonces: Arc::new(NonceManager::new(nonce)),
            submission: Arc::new(Mutex::new(())),
        }
    }

    pub fn key_pair(&self) -> &ed25519::Pair {
        &self.key_pair
    }

    pub fn public(&self) -> AccountId {
        self.key_pair.public()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The nonce the next submitted transaction of this account uses.
    pub fn nonce(&self) -> Nonce {
        self.nonces.current()
    }

    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    /// Serializes nonce assignment and hand-off to the ledger between concurrent submitters.
    pub(crate) async fn lock_submission(&self) -> MutexGuard<'_, ()> {
        self.submission.lock().await
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("nonce", &self.nonce())
            .finish()
    }
}
