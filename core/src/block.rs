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

//! Type definitions for blocks and the receipts of the transactions they include.
use parity_scale_codec::{Decode, Encode};

use crate::{hash_of, Address, BlockHash, BlockNumber, TxHash};

/// Why an included transaction did not take effect.
#[derive(Decode, Encode, Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureReason {
    /// The sender cannot pay for value and fee.
    InsufficientBalance,
    /// The gas limit does not cover the gas the transaction uses.
    OutOfGas,
    /// A contract already exists at the address the transaction would create.
    AddressOccupied,
}

#[derive(Decode, Encode, Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceiptStatus {
    Success,
    Failed(FailureReason),
}

/// Outcome of a transaction that was included in a block.
///
/// The sender nonce is consumed regardless of the status.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: BlockNumber,
    pub block_hash: BlockHash,
    pub status: ReceiptStatus,
    /// Address of the created contract. Only set for successful contract creation.
    pub contract_address: Option<Address>,
    pub gas_used: u64,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// A block with the receipts of all transactions it includes, in inclusion order.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct Block {
    pub number: BlockNumber,
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
    pub transactions: Vec<TxHash>,
    pub receipts: Vec<Receipt>,
}

impl Block {
    /// Hash identifying the block with the given header data.
    pub fn compute_hash(
        number: BlockNumber,
        parent_hash: &BlockHash,
        transactions: &[TxHash],
    ) -> BlockHash {
        hash_of(&(number, parent_hash, transactions))
    }

    pub fn genesis() -> Self {
        let parent_hash = BlockHash::zero();
        Block {
            number: 0,
            hash: Self::compute_hash(0, &parent_hash, &[]),
            parent_hash,
            transactions: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn receipt(&self, tx_hash: &TxHash) -> Option<&Receipt> {
        self.receipts
            .iter()
            .find(|receipt| receipt.transaction_hash == *tx_hash)
    }
}
