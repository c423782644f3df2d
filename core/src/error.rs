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

use crate::{Address, Eon, Version};

/// Reasons for the [crate::ChannelLedger] to reject an update.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("The update carries no participant signature")]
    MissingParticipantSignature,

    #[error("The participant signature does not verify")]
    InvalidParticipantSignature,

    #[error("The update carries no hub signature")]
    MissingHubSignature,

    #[error("The hub signature does not verify")]
    InvalidHubSignature,

    #[error("Update version {proposed} for {account:?} in eon {eon} must exceed {accepted}")]
    NonIncreasingVersion {
        account: Address,
        eon: Eon,
        accepted: Version,
        proposed: Version,
    },
}
