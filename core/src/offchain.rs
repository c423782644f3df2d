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

//! Off-chain transfers between channel participants and the root that summarizes them.
use parity_scale_codec::{Decode, Encode};

use crate::{empty_data_hash, hash_of, Address, Balance, Eon, Hash};

/// A transfer between two participants that is routed through the hub without touching the chain.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct OffchainTransaction {
    pub eon: Eon,
    pub from: Address,
    pub to: Address,
    pub amount: Balance,
    /// Creation time in milliseconds since the Unix epoch. Distinguishes otherwise equal
    /// transfers.
    pub timestamp: u64,
}

impl OffchainTransaction {
    pub fn new(eon: Eon, from: Address, to: Address, amount: Balance, timestamp: u64) -> Self {
        OffchainTransaction {
            eon,
            from,
            to,
            amount,
            timestamp,
        }
    }

    pub fn hash(&self) -> Hash {
        hash_of(self)
    }
}

/// Compute the binary Merkle root of `leaves`.
///
/// An odd node at the end of a level is paired with itself. The root of no leaves is
/// [empty_data_hash].
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return empty_data_hash();
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                hash_of(&(left, right))
            })
            .collect();
    }
    level[0]
}
