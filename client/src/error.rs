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

use jsonrpc_core_client::RpcError;
use parity_scale_codec::Error as CodecError;

use crate::keystore;
use hub_core::{Address, FailureReason, Nonce, TxHash};

/// Error that may be returned by any of the [crate::ChainConnector] methods
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Decoding the received data failed
    #[error("Decoding the received data failed")]
    Codec(#[from] CodecError),

    /// Error from the underlying RPC connection
    #[error("Error from the underlying RPC connection: {0}")]
    Rpc(String),

    /// The transaction signature does not verify or does not belong to the sender
    #[error("Invalid transaction {0:?}")]
    InvalidTransaction(TxHash),

    /// The ledger rejected the transaction nonce
    #[error("Invalid nonce {actual} for account {account:?}, expected {expected}")]
    InvalidNonce {
        account: Address,
        expected: Nonce,
        actual: Nonce,
    },

    /// Submission failed after the transaction may have reached the ledger
    ///
    /// The nonce stays consumed and the deferred for `tx_hash` stays registered. It resolves if
    /// the transaction is included.
    #[error("Outcome of submitting transaction {tx_hash:?} is unknown: {source}")]
    UnknownOutcome {
        tx_hash: TxHash,
        source: Box<Error>,
    },

    /// A deferred for the transaction hash is still pending
    #[error("A deferred for transaction {0:?} is already pending")]
    DuplicateDeferred(TxHash),

    /// The deferred was cancelled before a receipt arrived
    #[error("Deferred for transaction {0:?} was cancelled")]
    DeferredCancelled(TxHash),

    /// No receipt arrived within the time the caller was willing to wait
    #[error("Timed out waiting for the receipt of transaction {0:?}")]
    Timeout(TxHash),

    /// The contract artifact does not fit the supplied constructor arguments
    #[error("Invalid contract configuration: {0}")]
    Configuration(String),

    /// The contract creation transaction was included but failed
    #[error("Contract creation transaction {tx_hash:?} failed: {reason:?}")]
    ContractCreationFailed {
        tx_hash: TxHash,
        reason: FailureReason,
    },

    /// Failed to load a key from a keystore file
    #[error(transparent)]
    Keystore(#[from] keystore::Error),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether the ledger refused the transaction, so it will never be included.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InvalidTransaction(_) | Error::InvalidNonce { .. })
    }
}

impl From<RpcError> for Error {
    fn from(error: RpcError) -> Self {
        Error::Rpc(error.to_string())
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.into())
    }
}
