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

//! Provides the [Signature] slot type.
use parity_scale_codec::{Decode, Encode};

use crate::{ed25519, AccountId, CryptoPair as _};

/// Signature slot over an encoded payload.
///
/// An absent signature is an explicit variant rather than a reserved byte pattern so no real
/// signature can ever be mistaken for "unsigned".
#[derive(Decode, Encode, Clone, Debug, Eq, PartialEq)]
pub enum Signature {
    Unsigned,
    Signed(ed25519::Signature),
}

impl Signature {
    /// Sign the SCALE encoding of `payload` with `key`.
    pub fn create<T: Encode + ?Sized>(key: &ed25519::Pair, payload: &T) -> Self {
        Signature::Signed(key.sign(&payload.encode()))
    }

    pub fn is_signed(&self) -> bool {
        match self {
            Signature::Unsigned => false,
            Signature::Signed(_) => true,
        }
    }

    /// Returns `true` if the slot holds a signature by `signer` over the encoding of `payload`.
    ///
    /// An unsigned slot never verifies.
    pub fn verify<T: Encode + ?Sized>(&self, payload: &T, signer: &AccountId) -> bool {
        match self {
            Signature::Unsigned => false,
            Signature::Signed(signature) => {
                ed25519::Pair::verify(signature, payload.encode(), signer)
            }
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature::Unsigned
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unsigned_never_verifies() {
        let (key_pair, _) = ed25519::Pair::generate();
        assert!(!Signature::Unsigned.is_signed());
        assert!(!Signature::Unsigned.verify(&42u32, &key_pair.public()));
    }

    #[test]
    fn verifies_only_for_signer_and_payload() {
        let (key_pair, _) = ed25519::Pair::generate();
        let (other, _) = ed25519::Pair::generate();
        let signature = Signature::create(&key_pair, &42u32);

        assert!(signature.is_signed());
        assert!(signature.verify(&42u32, &key_pair.public()));
        assert!(!signature.verify(&43u32, &key_pair.public()));
        assert!(!signature.verify(&42u32, &other.public()));
    }

    #[test]
    fn decode_after_encode_is_identity() {
        let (key_pair, _) = ed25519::Pair::generate();
        for signature in vec![Signature::Unsigned, Signature::create(&key_pair, b"payload")] {
            let encoded = signature.encode();
            let decoded = Signature::decode(&mut &encoded[..]).unwrap();
            assert_eq!(signature, decoded);
        }
    }
}
