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

//! Define trait for client backends and provide emulator and remote node implementation
use futures::stream::BoxStream;

use crate::Error;
use hub_core::{
    Address, Balance, Block, BlockNumber, Nonce, Receipt, SignedTransaction, TxHash,
};

mod emulator;
mod remote_node;

pub use emulator::{Emulator, BASE_GAS, CREATE_GAS, DATA_BYTE_GAS};
pub use remote_node::{decode_value, encode_param, HttpTransport, RemoteNode, RpcTransport};

/// Backend for talking to the ledger of a block chain.
///
/// The interface is low-level. Nonces, deferreds and signing are handled by the client on top of
/// it.
#[async_trait::async_trait]
pub trait Backend {
    /// Hand a signed transaction to the ledger for inclusion in a future block.
    ///
    /// Returns once the ledger accepted the transaction into its pool. Inclusion is reported
    /// through [Backend::blocks].
    async fn submit(&self, transaction: SignedTransaction) -> Result<(), Error>;

    async fn balance(&self, address: &Address) -> Result<Balance, Error>;

    /// Number of transactions from `address` that were included in blocks.
    async fn nonce(&self, address: &Address) -> Result<Nonce, Error>;

    /// Code stored at a contract address. `None` if no contract exists at `address`.
    async fn code(&self, address: &Address) -> Result<Option<Vec<u8>>, Error>;

    /// Find a transaction that was submitted to the ledger, pending or included.
    async fn transaction(&self, tx_hash: &TxHash) -> Result<Option<SignedTransaction>, Error>;

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, Error>;

    async fn block(&self, number: BlockNumber) -> Result<Option<Block>, Error>;

    /// Number of the most recent block.
    async fn block_number(&self) -> Result<BlockNumber, Error>;

    /// Stream of new blocks in order.
    ///
    /// The emulator streams the blocks produced after the call. A remote node streams the blocks
    /// after the chain tip it saw when connecting.
    fn blocks(&self) -> BoxStream<'static, Block>;
}
