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

//! Provides [ChannelLedger] which enforces channel integrity for accepted updates.
use std::collections::HashMap;

use crate::{address_of, ed25519, AccountId, Address, ChannelError, Eon, Update};

/// Canonical channel state per participant and eon.
///
/// # Invariants
///
/// * Every stored update carries a valid participant and hub signature.
/// * For every participant and eon the version of the stored update only increases.
#[derive(Clone, Debug, Default)]
pub struct ChannelLedger {
    accepted: HashMap<(Address, Eon), Update>,
}

impl ChannelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest accepted update of `account` in `eon`.
    pub fn latest(&self, account: &Address, eon: Eon) -> Option<&Update> {
        self.accepted.get(&(*account, eon))
    }

    /// Countersign an update proposed by `participant` with the hub key and record it as the
    /// new channel state.
    ///
    /// The update is rejected and left untouched if the participant signature is missing or
    /// invalid or if its version does not exceed the accepted one.
    pub fn countersign(
        &mut self,
        participant: &AccountId,
        update: &mut Update,
        hub_key: &ed25519::Pair,
    ) -> Result<(), ChannelError> {
        check_participant_signature(participant, update)?;
        let account = address_of(participant);
        self.check_version(&account, update)?;
        update.sign_hub(hub_key);
        self.accepted.insert((account, update.eon()), update.clone());
        Ok(())
    }

    /// Accept a fully signed update as the new channel state of `participant`.
    pub fn accept(
        &mut self,
        participant: &AccountId,
        hub: &AccountId,
        update: Update,
    ) -> Result<(), ChannelError> {
        check_participant_signature(participant, &update)?;
        if !update.is_signed_by_hub() {
            return Err(ChannelError::MissingHubSignature);
        }
        if !update.verify_hub_sig(hub) {
            return Err(ChannelError::InvalidHubSignature);
        }
        let account = address_of(participant);
        self.check_version(&account, &update)?;
        self.accepted.insert((account, update.eon()), update);
        Ok(())
    }

    fn check_version(&self, account: &Address, update: &Update) -> Result<(), ChannelError> {
        match self.latest(account, update.eon()) {
            Some(accepted) if update.version() <= accepted.version() => {
                Err(ChannelError::NonIncreasingVersion {
                    account: *account,
                    eon: update.eon(),
                    accepted: accepted.version(),
                    proposed: update.version(),
                })
            }
            _ => Ok(()),
        }
    }
}

fn check_participant_signature(
    participant: &AccountId,
    update: &Update,
) -> Result<(), ChannelError> {
    if !update.is_signed() {
        return Err(ChannelError::MissingParticipantSignature);
    }
    if !update.verify_sig(participant) {
        return Err(ChannelError::InvalidParticipantSignature);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{CryptoPair as _, UpdateData, UpdateStatus};

    fn random_key() -> ed25519::Pair {
        ed25519::Pair::generate().0
    }

    fn signed_update(key: &ed25519::Pair, eon: Eon, version: u64) -> Update {
        let mut update = Update::new(UpdateData::new(eon, version).with_send_amount(100));
        update.sign(key);
        update
    }

    #[test]
    fn countersign_valid_update() {
        let participant = random_key();
        let hub = random_key();
        let mut ledger = ChannelLedger::new();
        let mut update = signed_update(&participant, 1, 1);

        ledger
            .countersign(&participant.public(), &mut update, &hub)
            .unwrap();

        assert_eq!(update.status(), UpdateStatus::FullySigned);
        assert!(update.verify_hub_sig(&hub.public()));
        let account = address_of(&participant.public());
        assert_eq!(ledger.latest(&account, 1), Some(&update));
    }

    #[test]
    fn reject_repeated_version() {
        let participant = random_key();
        let hub = random_key();
        let mut ledger = ChannelLedger::new();

        let mut first = signed_update(&participant, 1, 1);
        ledger
            .countersign(&participant.public(), &mut first, &hub)
            .unwrap();

        let mut second = signed_update(&participant, 1, 1);
        let result = ledger.countersign(&participant.public(), &mut second, &hub);

        assert_eq!(
            result,
            Err(ChannelError::NonIncreasingVersion {
                account: address_of(&participant.public()),
                eon: 1,
                accepted: 1,
                proposed: 1,
            })
        );
        assert!(!second.is_signed_by_hub());
    }

    #[test]
    fn versions_are_scoped_to_eon() {
        let participant = random_key();
        let hub = random_key();
        let mut ledger = ChannelLedger::new();

        let mut update = signed_update(&participant, 1, 5);
        ledger
            .countersign(&participant.public(), &mut update, &hub)
            .unwrap();

        let mut next_eon = signed_update(&participant, 2, 1);
        assert!(ledger
            .countersign(&participant.public(), &mut next_eon, &hub)
            .is_ok());
    }

    #[test]
    fn reject_unsigned_or_foreign_update() {
        let participant = random_key();
        let other = random_key();
        let hub = random_key();
        let mut ledger = ChannelLedger::new();

        let mut unsigned = Update::new(UpdateData::new(1, 1));
        assert_eq!(
            ledger.countersign(&participant.public(), &mut unsigned, &hub),
            Err(ChannelError::MissingParticipantSignature)
        );

        let mut foreign = signed_update(&other, 1, 1);
        assert_eq!(
            ledger.countersign(&participant.public(), &mut foreign, &hub),
            Err(ChannelError::InvalidParticipantSignature)
        );
        assert_eq!(ledger.latest(&address_of(&participant.public()), 1), None);
    }

    #[test]
    fn accept_requires_hub_signature() {
        let participant = random_key();
        let hub = random_key();
        let mut ledger = ChannelLedger::new();

        let update = signed_update(&participant, 1, 1);
        assert_eq!(
            ledger.accept(&participant.public(), &hub.public(), update.clone()),
            Err(ChannelError::MissingHubSignature)
        );

        let mut wrong_hub = update.clone();
        wrong_hub.sign_hub(&participant);
        assert_eq!(
            ledger.accept(&participant.public(), &hub.public(), wrong_hub),
            Err(ChannelError::InvalidHubSignature)
        );

        let mut countersigned = update;
        countersigned.sign_hub(&hub);
        assert!(ledger
            .accept(&participant.public(), &hub.public(), countersigned)
            .is_ok());
    }

    #[test]
    fn accept_enforces_increasing_versions() {
        let participant = random_key();
        let hub = random_key();
        let mut ledger = ChannelLedger::new();

        for version in &[1, 2, 5] {
            let mut update = signed_update(&participant, 1, *version);
            update.sign_hub(&hub);
            ledger
                .accept(&participant.public(), &hub.public(), update)
                .unwrap();
        }

        let mut stale = signed_update(&participant, 1, 4);
        stale.sign_hub(&hub);
        assert!(ledger
            .accept(&participant.public(), &hub.public(), stale)
            .is_err());
    }
}
