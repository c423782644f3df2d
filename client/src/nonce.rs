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

//! Provides [NonceManager].
use std::sync::atomic::{AtomicU64, Ordering};

use hub_core::Nonce;

/// Transaction sequence counter of a single account.
///
/// Concurrent callers of [NonceManager::next_nonce] observe disjoint and gapless values.
#[derive(Debug, Default)]
pub struct NonceManager {
    next: AtomicU64,
}

impl NonceManager {
    pub fn new(initial: Nonce) -> Self {
        NonceManager {
            next: AtomicU64::new(initial),
        }
    }

    /// Return the current nonce and advance the counter by one.
    pub fn next_nonce(&self) -> Nonce {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The nonce the next call to [NonceManager::next_nonce] returns.
    pub fn current(&self) -> Nonce {
        self.next.load(Ordering::SeqCst)
    }

    /// Give back `nonce` if it is the most recently reserved one.
    ///
    /// Returns `false` and leaves the counter untouched if another nonce was reserved after
    /// `nonce`.
    pub fn rollback(&self, nonce: Nonce) -> bool {
        self.next
            .compare_exchange(nonce + 1, nonce, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Overwrite the counter, for example with the nonce the ledger reports for the account.
    pub fn reset(&self, nonce: Nonce) {
        self.next.store(nonce, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn concurrent_nonces_are_gapless() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 250;
        let initial = 17;
        let nonces = Arc::new(NonceManager::new(initial));

        let handles = (0..THREADS)
            .map(|_| {
                let nonces = nonces.clone();
                std::thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| nonces.next_nonce())
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        for handle in handles {
            for nonce in handle.join().unwrap() {
                assert!(seen.insert(nonce), "nonce {} returned twice", nonce);
            }
        }

        let expected = (initial..initial + THREADS * PER_THREAD).collect::<HashSet<_>>();
        assert_eq!(seen, expected);
        assert_eq!(nonces.current(), initial + THREADS * PER_THREAD);
    }

    #[test]
    fn rollback_only_latest_reservation() {
        let nonces = NonceManager::new(0);
        let first = nonces.next_nonce();
        let second = nonces.next_nonce();

        assert!(!nonces.rollback(first));
        assert!(nonces.rollback(second));
        assert_eq!(nonces.current(), 1);
        assert_eq!(nonces.next_nonce(), 1);
    }
}
