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

//! Client for submitting transactions to a hub ledger and observing their inclusion.
//!
//! [Client] implements [ChainConnector] on top of a [backend::Backend]. Use
//! [Client::new_emulator] for an in-memory ledger and [Client::create] to connect to a node.
use std::path::Path;
use std::sync::Arc;

pub mod backend;
pub mod config;
pub mod deferred;
pub mod keystore;

mod account;
mod contract;
mod deployment;
mod error;
mod event;
mod interface;
mod nonce;
mod transaction;

pub use crate::backend::{Backend, Emulator, RemoteNode};
pub use crate::config::ChainConfig;
pub use crate::contract::ParamKind;
pub use crate::deferred::DeferredRegistry;
pub use crate::deployment::{DeploymentError, HubDeployment};
pub use crate::interface::*;
pub use crate::nonce::NonceManager;

use crate::event::Watchers;

/// Client to interact with a hub ledger.
///
/// A background task delivers the blocks of the backend to pending deferreds and watchers.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend + Send + Sync>,
    deferreds: Arc<DeferredRegistry>,
    watchers: Arc<Watchers>,
    config: Arc<ChainConfig>,
}

impl Client {
    pub fn new(backend: Arc<dyn Backend + Send + Sync>, config: ChainConfig) -> Self {
        let deferreds = Arc::new(DeferredRegistry::new());
        let watchers = Arc::new(Watchers::new());
        async_std::task::spawn(event::dispatch(
            backend.blocks(),
            deferreds.clone(),
            watchers.clone(),
        ));
        Client {
            backend,
            deferreds,
            watchers,
            config: Arc::new(config),
        }
    }

    /// Create a client with an auto mining [Emulator] backend.
    ///
    /// The emulator is returned as well to fund accounts and to produce blocks.
    pub fn new_emulator() -> (Self, Emulator) {
        let emulator = Emulator::new();
        let client = Self::new(Arc::new(emulator.clone()), ChainConfig::default());
        (client, emulator)
    }

    /// Create a client with an [Emulator] set up from `config`.
    pub fn emulator_from_config(config: ChainConfig) -> Result<(Self, Emulator), Error> {
        let emulator = Emulator::from_config(&config)?;
        let client = Self::new(Arc::new(emulator.clone()), config);
        Ok((client, emulator))
    }

    /// Connect to the node at [ChainConfig::node_url].
    ///
    /// Fails if it cannot connect to the node.
    pub async fn create(config: ChainConfig) -> Result<Self, Error> {
        let node = RemoteNode::create(&config).await?;
        Ok(Self::new(Arc::new(node), config))
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Deferreds of submitted transactions that are not yet included.
    pub fn deferreds(&self) -> &DeferredRegistry {
        &self.deferreds
    }
}

#[async_trait::async_trait]
impl ChainConnector for Client {
    async fn submit_transaction(
        &self,
        account: &Account,
        request: TransactionRequest,
    ) -> Result<TxDeferred, Error> {
        let _submission = account.lock_submission().await;
        let nonce = account.nonces().next_nonce();
        let transaction = request
            .into_transaction(account.address(), nonce, &self.config)
            .sign(account.key_pair());

        let result = self.submit_signed_transaction(transaction).await;
        match &result {
            Ok(_) | Err(Error::UnknownOutcome { .. }) => {}
            Err(Error::InvalidNonce { expected, .. }) => {
                log::warn!(
                    "Resyncing nonce of account {:?} from {} to {}",
                    account.address(),
                    nonce,
                    expected
                );
                account.nonces().reset(*expected);
            }
            Err(_) => {
                account.nonces().rollback(nonce);
            }
        }
        result
    }

    async fn submit_signed_transaction(
        &self,
        transaction: SignedTransaction,
    ) -> Result<TxDeferred, Error> {
        let tx_hash = transaction.hash();
        let deferred = self.deferreds.register(tx_hash)?;
        log::debug!(
            "Submitting transaction {:?} with nonce {}",
            tx_hash,
            transaction.transaction.nonce
        );
        match self.backend.submit(transaction).await {
            Ok(()) => Ok(deferred),
            Err(err) if err.is_rejection() => {
                self.deferreds.cancel(&tx_hash);
                Err(err)
            }
            Err(err) => {
                log::warn!("Submission of transaction {:?} failed: {}", tx_hash, err);
                Err(Error::UnknownOutcome {
                    tx_hash,
                    source: Box::new(err),
                })
            }
        }
    }

    async fn deploy_contract(
        &self,
        account: &Account,
        artifact: &ContractArtifact,
        args: Vec<ConstructorArg>,
    ) -> Result<Contract, Error> {
        let payload = artifact.creation_payload(&args)?;
        let deferred = self
            .submit_transaction(account, TransactionRequest::create(payload))
            .await?;
        let tx_hash = deferred.tx_hash();
        let receipt = deferred.await?;

        match (receipt.status, receipt.contract_address) {
            (ReceiptStatus::Success, Some(address)) => {
                log::debug!(
                    "Contract {} created at {:?} in block {}",
                    artifact.interface.name,
                    address,
                    receipt.block_number
                );
                Ok(Contract::new(address, artifact.interface.clone()))
            }
            (ReceiptStatus::Failed(reason), _) => {
                Err(Error::ContractCreationFailed { tx_hash, reason })
            }
            (ReceiptStatus::Success, None) => Err(Error::Other(format!(
                "Receipt of contract creation {:?} has no contract address",
                tx_hash
            ))),
        }
    }

    fn load_contract(&self, address: Address, interface: ContractInterface) -> Contract {
        Contract::new(address, interface)
    }

    async fn balance(&self, address: &Address) -> Result<Balance, Error> {
        self.backend.balance(address).await
    }

    async fn nonce(&self, address: &Address) -> Result<Nonce, Error> {
        self.backend.nonce(address).await
    }

    async fn find_transaction(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<SignedTransaction>, Error> {
        self.backend.transaction(tx_hash).await
    }

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, Error> {
        self.backend.receipt(tx_hash).await
    }

    async fn code(&self, address: &Address) -> Result<Option<Vec<u8>>, Error> {
        self.backend.code(address).await
    }

    async fn block(&self, number: BlockNumber) -> Result<Option<Block>, Error> {
        self.backend.block(number).await
    }

    async fn block_number(&self) -> Result<BlockNumber, Error> {
        self.backend.block_number().await
    }

    fn watch_blocks<F>(&self, callback: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.watchers.add_block_watcher(Arc::new(callback));
    }

    async fn watch_transaction<F>(&self, tx_hash: TxHash, listener: F) -> Result<(), Error>
    where
        F: FnOnce(&Receipt) + Send + 'static,
    {
        self.watchers
            .add_transaction_listener(tx_hash, Box::new(listener));
        // The transaction may have been included before the listener was registered.
        if let Some(receipt) = self.backend.receipt(&tx_hash).await? {
            self.watchers.notify_receipt(&receipt);
        }
        Ok(())
    }

    async fn create_account(&self) -> Result<Account, Error> {
        let (key_pair, _) = ed25519::Pair::generate();
        self.create_account_from_key(key_pair).await
    }

    async fn create_account_from_key(&self, key_pair: ed25519::Pair) -> Result<Account, Error> {
        let nonce = self.backend.nonce(&address_of(&key_pair.public())).await?;
        Ok(Account::new(key_pair, nonce))
    }

    async fn create_account_from_keystore(
        &self,
        path: &Path,
        password: &str,
        decryptor: &(dyn KeyDecryptor + Sync),
    ) -> Result<Account, Error> {
        let key_pair = keystore::load_key_pair(path, password, decryptor)?;
        self.create_account_from_key(key_pair).await
    }
}
