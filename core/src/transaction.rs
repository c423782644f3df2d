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

//! Provides [Transaction] and [SignedTransaction].
use parity_scale_codec::{Decode, Encode};
use sp_core::hashing::blake2_256;

use crate::{
    address_of, ed25519, hash_of, AccountId, Address, Balance, CryptoPair as _, Nonce, TxHash,
    H160,
};

/// What a [Transaction] does when it is applied.
#[derive(Decode, Encode, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Create a contract. The payload is the contract code followed by the encoded constructor
    /// arguments.
    Create,
    /// Transfer value to and call the given address.
    Call(Address),
}

/// Transaction that can be submitted to the chain.
///
/// A transaction is immutable once constructed. It must be signed by the key of `from` with
/// [Transaction::sign] before it is submitted.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    pub from: Address,
    /// The nonce of the sending account. Must equal the number of transactions the account has
    /// submitted before.
    pub nonce: Nonce,
    pub gas_price: Balance,
    pub gas_limit: u64,
    pub action: Action,
    pub value: Balance,
    pub data: Vec<u8>,
}

impl Transaction {
    /// Address of the contract created by this transaction.
    ///
    /// Returns `None` if the transaction does not create a contract.
    pub fn contract_address(&self) -> Option<Address> {
        match self.action {
            Action::Create => Some(contract_address(&self.from, self.nonce)),
            Action::Call(_) => None,
        }
    }

    pub fn sign(self, key: &ed25519::Pair) -> SignedTransaction {
        SignedTransaction::new_signed(key, self)
    }
}

/// Address of a contract created by `sender` with a transaction using `nonce`.
pub fn contract_address(sender: &Address, nonce: Nonce) -> Address {
    let hash = blake2_256(&(sender, nonce).encode());
    H160::from_slice(&hash[12..])
}

/// [Transaction] with the signature of its sender.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signer: AccountId,
    pub signature: ed25519::Signature,
}

impl SignedTransaction {
    pub fn new_signed(key: &ed25519::Pair, transaction: Transaction) -> Self {
        let signature = key.sign(&transaction.encode());
        SignedTransaction {
            transaction,
            signer: key.public(),
            signature,
        }
    }

    pub fn hash(&self) -> TxHash {
        hash_of(self)
    }

    /// Returns `true` if the signer owns the sending address and the signature is valid.
    pub fn verify(&self) -> bool {
        address_of(&self.signer) == self.transaction.from
            && ed25519::Pair::verify(&self.signature, self.transaction.encode(), &self.signer)
    }
}
