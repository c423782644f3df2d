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

//! Signed off-chain channel state.
//!
//! An [Update] summarizes a participant's balance in the channel with the hub at a given eon and
//! version. It carries two independent signature slots. The participant signs first, the hub
//! countersigns. Only an update carrying both signatures can be used to settle or dispute a
//! channel on-chain.
//!
//! Both signatures cover the encoded [UpdateData] only and never the sibling signature slot. The
//! two signing steps are therefore independent of each other and of their order.
use parity_scale_codec::{Decode, DecodeAll as _, Encode, Error as CodecError};

use crate::offchain::{self, OffchainTransaction};
use crate::{
    ed25519, empty_data_hash, hash_of, AccountId, Address, Balance, Eon, Hash, Signature, Version,
};

/// The signed payload of an [Update].
///
/// # Invariants
///
/// * For a given channel and eon `version` strictly increases across accepted updates. This is
///   enforced by consumers like [crate::ChannelLedger], not by the type itself.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct UpdateData {
    pub eon: Eon,
    pub version: Version,
    pub send_amount: Balance,
    pub receive_amount: Balance,
    /// Root of the off-chain transactions this update accounts for.
    pub root: Hash,
}

impl UpdateData {
    /// Create update data with zero amounts and the root of an empty transaction set.
    pub fn new(eon: Eon, version: Version) -> Self {
        UpdateData {
            eon,
            version,
            send_amount: 0,
            receive_amount: 0,
            root: empty_data_hash(),
        }
    }

    pub fn with_send_amount(mut self, send_amount: Balance) -> Self {
        self.send_amount = send_amount;
        self
    }

    pub fn with_receive_amount(mut self, receive_amount: Balance) -> Self {
        self.receive_amount = receive_amount;
        self
    }

    pub fn with_root(mut self, root: Hash) -> Self {
        self.root = root;
        self
    }

    /// Summarize the off-chain transactions of `address`.
    ///
    /// Amounts sent from and received by `address` are summed up. The root is the Merkle root
    /// of all transaction hashes in the given order.
    pub fn from_transactions(
        eon: Eon,
        version: Version,
        address: &Address,
        transactions: &[OffchainTransaction],
    ) -> Self {
        let mut send_amount: Balance = 0;
        let mut receive_amount: Balance = 0;
        for tx in transactions {
            if tx.from == *address {
                send_amount = send_amount.saturating_add(tx.amount);
            }
            if tx.to == *address {
                receive_amount = receive_amount.saturating_add(tx.amount);
            }
        }
        let hashes = transactions.iter().map(OffchainTransaction::hash).collect::<Vec<_>>();
        UpdateData {
            eon,
            version,
            send_amount,
            receive_amount,
            root: offchain::merkle_root(&hashes),
        }
    }

    pub fn hash(&self) -> Hash {
        hash_of(self)
    }
}

/// Signing progress of an [Update].
///
/// A rejected update has no status of its own. The hub refuses to countersign and the update is
/// discarded, see [crate::ChannelLedger::countersign].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateStatus {
    Unsigned,
    ParticipantSigned,
    HubSigned,
    FullySigned,
}

/// Channel state update with participant and hub signature slots.
///
/// Both slots start out as [Signature::Unsigned].
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub struct Update {
    data: UpdateData,
    sign: Signature,
    hub_sign: Signature,
}

impl Update {
    pub fn new(data: UpdateData) -> Self {
        Self::with_signatures(data, Signature::Unsigned, Signature::Unsigned)
    }

    /// Reassemble an update from data and already known signatures, for example after
    /// receiving them from the other party.
    pub fn with_signatures(data: UpdateData, sign: Signature, hub_sign: Signature) -> Self {
        Update {
            data,
            sign,
            hub_sign,
        }
    }

    pub fn data(&self) -> &UpdateData {
        &self.data
    }

    pub fn eon(&self) -> Eon {
        self.data.eon
    }

    pub fn version(&self) -> Version {
        self.data.version
    }

    pub fn send_amount(&self) -> Balance {
        self.data.send_amount
    }

    pub fn receive_amount(&self) -> Balance {
        self.data.receive_amount
    }

    pub fn root(&self) -> Hash {
        self.data.root
    }

    /// The participant signature slot.
    pub fn signature(&self) -> &Signature {
        &self.sign
    }

    pub fn hub_signature(&self) -> &Signature {
        &self.hub_sign
    }

    pub fn is_signed(&self) -> bool {
        self.sign.is_signed()
    }

    pub fn is_signed_by_hub(&self) -> bool {
        self.hub_sign.is_signed()
    }

    pub fn status(&self) -> UpdateStatus {
        match (self.is_signed(), self.is_signed_by_hub()) {
            (false, false) => UpdateStatus::Unsigned,
            (true, false) => UpdateStatus::ParticipantSigned,
            (false, true) => UpdateStatus::HubSigned,
            (true, true) => UpdateStatus::FullySigned,
        }
    }

    /// Sign the update data as participant.
    ///
    /// Replaces a previous participant signature. The hub has to verify the new signature again
    /// before its countersignature means anything.
    pub fn sign(&mut self, key: &ed25519::Pair) {
        self.sign = Signature::create(key, &self.data);
    }

    /// Sign the update data as hub.
    pub fn sign_hub(&mut self, key: &ed25519::Pair) {
        self.hub_sign = Signature::create(key, &self.data);
    }

    /// Returns `true` if the participant slot holds a valid signature by `signer`.
    pub fn verify_sig(&self, signer: &AccountId) -> bool {
        self.sign.verify(&self.data, signer)
    }

    /// Returns `true` if the hub slot holds a valid signature by `hub`.
    pub fn verify_hub_sig(&self, hub: &AccountId) -> bool {
        self.hub_sign.verify(&self.data, hub)
    }

    /// Encode the update with a schema version tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        VersionedUpdate::from(self.clone()).encode()
    }

    /// Decode an update produced by [Update::to_bytes].
    ///
    /// Fails if the data is malformed, has trailing bytes or uses an unknown schema version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        VersionedUpdate::decode_all(&mut &bytes[..]).map(Update::from)
    }
}

/// Wire representation of an [Update] tagged with its schema version.
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub enum VersionedUpdate {
    V1(Update),
}

impl From<Update> for VersionedUpdate {
    fn from(update: Update) -> Self {
        VersionedUpdate::V1(update)
    }
}

impl From<VersionedUpdate> for Update {
    fn from(versioned: VersionedUpdate) -> Self {
        match versioned {
            VersionedUpdate::V1(update) => update,
        }
    }
}
