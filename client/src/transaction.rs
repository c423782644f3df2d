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

//! Provides [TransactionRequest].
use hub_core::{Action, Address, Balance, Nonce, Transaction};

use crate::ChainConfig;

/// What a caller wants a transaction to do.
///
/// The sender and nonce are filled in by [crate::ChainConnector::submit_transaction]. Gas price and
/// limit default to the values of the [ChainConfig] of the client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionRequest {
    pub action: Action,
    pub value: Balance,
    pub data: Vec<u8>,
    pub gas_price: Option<Balance>,
    pub gas_limit: Option<u64>,
}

impl TransactionRequest {
    /// Call the contract at `address` with `data`.
    pub fn call(address: Address, data: Vec<u8>) -> Self {
        TransactionRequest {
            action: Action::Call(address),
            value: 0,
            data,
            gas_price: None,
            gas_limit: None,
        }
    }

    /// Transfer `value` to `recipient`.
    pub fn transfer(recipient: Address, value: Balance) -> Self {
        TransactionRequest {
            value,
            ..Self::call(recipient, Vec::new())
        }
    }

    /// Create a contract from `payload`, which is the code followed by the encoded constructor
    /// arguments.
    pub fn create(payload: Vec<u8>) -> Self {
        TransactionRequest {
            action: Action::Create,
            value: 0,
            data: payload,
            gas_price: None,
            gas_limit: None,
        }
    }

    pub fn with_value(mut self, value: Balance) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_price(mut self, gas_price: Balance) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn into_transaction(
        self,
        from: Address,
        nonce: Nonce,
        config: &ChainConfig,
    ) -> Transaction {
        Transaction {
            from,
            nonce,
            gas_price: self.gas_price.unwrap_or(config.gas_price),
            gas_limit: self.gas_limit.unwrap_or(config.gas_limit),
            action: self.action,
            value: self.value,
            data: self.data,
        }
    }
}
