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

//! Provide an abstract trait for chain connectors and the necessary types.
//!
//! The [ChainConnector] trait defines methods to submit transactions, deploy contracts, look up
//! ledger state and observe new blocks.
use std::path::Path;

pub use hub_core::*;

pub use crate::account::Account;
pub use crate::contract::{Contract, ContractArtifact, ContractInterface, ConstructorArg};
pub use crate::deferred::TxDeferred;
pub use crate::error::Error;
pub use crate::keystore::KeyDecryptor;
pub use crate::transaction::TransactionRequest;

/// Trait for ledger clients sending transactions and looking up state.
#[async_trait::async_trait]
pub trait ChainConnector {
    /// Sign and submit a transaction from `account`.
    ///
    /// If the ledger rejects the transaction the nonce is handed out again. An
    /// [Error::InvalidNonce] rejection resyncs the account nonce to the one the ledger expects.
    /// Any other failure returns [Error::UnknownOutcome]: the nonce stays consumed and the
    /// deferred stays available through [crate::Client::deferreds].
    ///
    /// ```no_run
    /// # use hub_client::*;
    /// # async fn example(
    /// #     client: Client,
    /// #     account: Account,
    /// #     recipient: Address,
    /// # ) -> Result<(), Error> {
    ///
    /// // Submit the transaction to the ledger.
    /// //
    /// // If this is successful the ledger accepted the transaction and the account nonce was
    /// // advanced. The call does not wait for the transaction to be included in a block.
    /// let deferred = client
    ///     .submit_transaction(&account, TransactionRequest::transfer(recipient, 10))
    ///     .await?;
    ///
    /// // We can now wait for the transaction to be included in a block.
    /// //
    /// // This does not error if the transaction failed while being applied. See
    /// // Receipt::status for that.
    /// let receipt = deferred.await?;
    ///
    /// Ok(())
    /// # }
    /// ```
    async fn submit_transaction(
        &self,
        account: &Account,
        request: TransactionRequest,
    ) -> Result<TxDeferred, Error>;

    /// Submit a transaction that was signed already.
    ///
    /// The nonce of the transaction is not checked against any [Account]. Stale or duplicate
    /// nonces are rejected by the ledger.
    async fn submit_signed_transaction(
        &self,
        transaction: SignedTransaction,
    ) -> Result<TxDeferred, Error>;

    /// Create a contract from `artifact` and wait until it is included in a block.
    ///
    /// Fails immediately with [Error::Configuration] if `args` do not fit the constructor of the
    /// contract and with [Error::ContractCreationFailed] if the creation transaction failed.
    async fn deploy_contract(
        &self,
        account: &Account,
        artifact: &ContractArtifact,
        args: Vec<ConstructorArg>,
    ) -> Result<Contract, Error>;

    /// Return a handle to the contract at `address`. Does not talk to the ledger.
    fn load_contract(&self, address: Address, interface: ContractInterface) -> Contract;

    async fn balance(&self, address: &Address) -> Result<Balance, Error>;

    /// Fetch the number of included transactions of `address` from the ledger.
    async fn nonce(&self, address: &Address) -> Result<Nonce, Error>;

    async fn find_transaction(&self, tx_hash: &TxHash)
        -> Result<Option<SignedTransaction>, Error>;

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, Error>;

    async fn code(&self, address: &Address) -> Result<Option<Vec<u8>>, Error>;

    async fn block(&self, number: BlockNumber) -> Result<Option<Block>, Error>;

    async fn block_number(&self) -> Result<BlockNumber, Error>;

    /// Call `callback` with every block produced from now on.
    fn watch_blocks<F>(&self, callback: F)
    where
        F: Fn(&Block) + Send + Sync + 'static;

    /// Call `listener` once with the receipt of the transaction.
    ///
    /// If the transaction is already included the listener is called before this returns.
    async fn watch_transaction<F>(&self, tx_hash: TxHash, listener: F) -> Result<(), Error>
    where
        F: FnOnce(&Receipt) + Send + 'static;

    /// Create an account with a new random key.
    async fn create_account(&self) -> Result<Account, Error>;

    /// Create an account for `key_pair` whose nonce is initialized from the ledger.
    async fn create_account_from_key(&self, key_pair: ed25519::Pair) -> Result<Account, Error>;

    /// Load the key from a keystore file and create an account for it.
    async fn create_account_from_keystore(
        &self,
        path: &Path,
        password: &str,
        decryptor: &(dyn KeyDecryptor + Sync),
    ) -> Result<Account, Error>;
}
