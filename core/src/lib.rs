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

//! Basic types used by the hub chain connector.
//!
//! This crate holds everything that is shared between the chain layer and the off-chain channel
//! protocol: addresses and hashes, on-chain [Transaction]s with their [Receipt]s and [Block]s, and
//! the signed channel state [Update] exchanged between a participant and the hub.

use parity_scale_codec::Encode;
use sp_core::hashing::blake2_256;

pub use sp_core::crypto::{Pair as CryptoPair, SecretStringError as CryptoError};
pub use sp_core::{ed25519, H160, H256};

pub mod block;
pub use block::{Block, FailureReason, Receipt, ReceiptStatus};

pub mod channel;
pub use channel::ChannelLedger;

mod error;
pub use error::ChannelError;

pub mod offchain;
pub use offchain::OffchainTransaction;

pub mod signature;
pub use signature::Signature;

pub mod transaction;
pub use transaction::{contract_address, Action, SignedTransaction, Transaction};

pub mod update;
pub use update::{Update, UpdateData, UpdateStatus, VersionedUpdate};

/// Identifier of an account or a contract on the chain.
pub type Address = H160;

/// Content hash. Identifies transactions, blocks and channel state roots.
pub type Hash = H256;

/// The hash of a transaction. Uniquely identifies a transaction.
pub type TxHash = Hash;

/// The hash of a block. Uniquely identifies a block.
pub type BlockHash = Hash;

pub type BlockNumber = u64;

/// Balance of an account.
pub type Balance = u128;

/// Number of transactions an account has submitted.
pub type Nonce = u64;

/// Epoch of the channel network. Channel state versions are scoped to an eon.
pub type Eon = u32;

/// Sequence number of a channel [Update] within an eon.
pub type Version = u64;

/// Public key of an account holder. The [Address] of an account is derived from it.
pub type AccountId = ed25519::Public;

/// Blake2-256 hash of the SCALE encoding of `value`.
pub fn hash_of<T: Encode + ?Sized>(value: &T) -> Hash {
    H256::from(blake2_256(&value.encode()))
}

/// Hash of the empty byte string. Used as the root of an empty transaction set.
pub fn empty_data_hash() -> Hash {
    H256::from(blake2_256(&[]))
}

/// Derive the on-chain address of the account identified by the public key.
///
/// The address consists of the last 20 bytes of the Blake2-256 hash of the key.
pub fn address_of(account_id: &AccountId) -> Address {
    let hash = blake2_256(account_id.as_ref());
    H160::from_slice(&hash[12..])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_is_stable_per_key() {
        let (key_pair, _) = ed25519::Pair::generate();
        let (other, _) = ed25519::Pair::generate();

        assert_eq!(address_of(&key_pair.public()), address_of(&key_pair.public()));
        assert_ne!(address_of(&key_pair.public()), address_of(&other.public()));
    }

    #[test]
    fn empty_data_hash_differs_from_zero() {
        assert_ne!(empty_data_hash(), Hash::zero());
    }
}
