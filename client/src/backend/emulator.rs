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

//! Provides [Emulator] backend to run the ledger in memory.

use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt as _};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend;
use crate::{ChainConfig, Error};
use hub_core::{
    Action, Address, Balance, Block, BlockNumber, FailureReason, Nonce, Receipt, ReceiptStatus,
    SignedTransaction, Transaction, TxHash,
};

/// Gas every transaction uses.
pub const BASE_GAS: u64 = 21_000;

/// Additional gas per payload byte.
pub const DATA_BYTE_GAS: u64 = 16;

/// Additional gas for creating a contract.
pub const CREATE_GAS: u64 = 32_000;

/// [backend::Backend] implementation that keeps the ledger state in memory.
///
/// # Differences with real backend
///
/// * In auto mine mode every [backend::Backend::submit] call creates a new block that only
///   contains the submitted transaction. Otherwise blocks are only created by
///   [Emulator::produce_block].
///
/// * Contracts are not executed. Creating a contract stores the creation payload as the contract
///   code and calls only transfer value.
///
/// * Balances can be created out of thin air with [Emulator::mint].
#[derive(Clone)]
pub struct Emulator {
    state: Arc<Mutex<EmulatorState>>,
}

#[derive(Default)]
struct AccountState {
    balance: Balance,
    nonce: Nonce,
}

/// Mutable state of the emulator.
struct EmulatorState {
    auto_mine: bool,
    accounts: HashMap<Address, AccountState>,
    /// Submitted transactions that are not yet included in a block, in submission order.
    pool: Vec<SignedTransaction>,
    transactions: HashMap<TxHash, SignedTransaction>,
    receipts: HashMap<TxHash, Receipt>,
    code: HashMap<Address, Vec<u8>>,
    blocks: Vec<Block>,
    subscribers: Vec<mpsc::UnboundedSender<Block>>,
}

impl Emulator {
    /// Create an emulator that includes every transaction in its own block right away.
    pub fn new() -> Self {
        Self::with_genesis(true, Vec::new())
    }

    /// Create an emulator that only produces blocks on [Emulator::produce_block].
    pub fn manual() -> Self {
        Self::with_genesis(false, Vec::new())
    }

    pub fn with_genesis(
        auto_mine: bool,
        balances: impl IntoIterator<Item = (Address, Balance)>,
    ) -> Self {
        let accounts = balances
            .into_iter()
            .map(|(address, balance)| (address, AccountState { balance, nonce: 0 }))
            .collect();
        Emulator {
            state: Arc::new(Mutex::new(EmulatorState {
                auto_mine,
                accounts,
                pool: Vec::new(),
                transactions: HashMap::new(),
                receipts: HashMap::new(),
                code: HashMap::new(),
                blocks: vec![Block::genesis()],
                subscribers: Vec::new(),
            })),
        }
    }

    /// Create an emulator with the mining mode and genesis balances from `config`.
    pub fn from_config(config: &ChainConfig) -> Result<Self, Error> {
        let balances = config
            .genesis_balances()
            .map_err(|err| Error::Other(err.to_string()))?;
        Ok(Self::with_genesis(config.auto_mine, balances))
    }

    /// Add `amount` to the balance of `address`.
    pub fn mint(&self, address: &Address, amount: Balance) {
        let mut state = self.lock();
        let account = state.accounts.entry(*address).or_default();
        account.balance = account.balance.saturating_add(amount);
    }

    /// Include all pending transactions in a new block and return it.
    ///
    /// Creates an empty block if no transactions are pending.
    pub fn produce_block(&self) -> Block {
        self.lock().produce_block()
    }

    /// Number of submitted transactions that are not yet included in a block.
    pub fn pending_count(&self) -> usize {
        self.lock().pool.len()
    }

    fn lock(&self) -> MutexGuard<'_, EmulatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Emulator")
            .field("auto_mine", &state.auto_mine)
            .field("block_number", &state.tip().number)
            .field("pending", &state.pool.len())
            .finish()
    }
}

#[async_trait::async_trait]
impl backend::Backend for Emulator {
    async fn submit(&self, signed: SignedTransaction) -> Result<(), Error> {
        let tx_hash = signed.hash();
        if !signed.verify() {
            return Err(Error::InvalidTransaction(tx_hash));
        }

        let mut state = self.lock();
        let sender = signed.transaction.from;
        let expected = state.pending_nonce(&sender);
        if signed.transaction.nonce != expected {
            return Err(Error::InvalidNonce {
                account: sender,
                expected,
                actual: signed.transaction.nonce,
            });
        }

        log::debug!(
            "Emulator accepted transaction {:?} from {:?} with nonce {}",
            tx_hash,
            sender,
            expected
        );
        state.transactions.insert(tx_hash, signed.clone());
        state.pool.push(signed);
        if state.auto_mine {
            state.produce_block();
        }
        Ok(())
    }

    async fn balance(&self, address: &Address) -> Result<Balance, Error> {
        Ok(self
            .lock()
            .accounts
            .get(address)
            .map(|account| account.balance)
            .unwrap_or(0))
    }

    async fn nonce(&self, address: &Address) -> Result<Nonce, Error> {
        Ok(self
            .lock()
            .accounts
            .get(address)
            .map(|account| account.nonce)
            .unwrap_or(0))
    }

    async fn code(&self, address: &Address) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.lock().code.get(address).cloned())
    }

    async fn transaction(&self, tx_hash: &TxHash) -> Result<Option<SignedTransaction>, Error> {
        Ok(self.lock().transactions.get(tx_hash).cloned())
    }

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, Error> {
        Ok(self.lock().receipts.get(tx_hash).cloned())
    }

    async fn block(&self, number: BlockNumber) -> Result<Option<Block>, Error> {
        Ok(self.lock().blocks.get(number as usize).cloned())
    }

    async fn block_number(&self) -> Result<BlockNumber, Error> {
        Ok(self.lock().tip().number)
    }

    fn blocks(&self) -> BoxStream<'static, Block> {
        let (sender, receiver) = mpsc::unbounded();
        self.lock().subscribers.push(sender);
        receiver.boxed()
    }
}

impl EmulatorState {
    fn tip(&self) -> &Block {
        // The genesis block is never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// The nonce the next transaction of `address` must carry, counting pending transactions.
    fn pending_nonce(&self, address: &Address) -> Nonce {
        let included = self
            .accounts
            .get(address)
            .map(|account| account.nonce)
            .unwrap_or(0);
        let pending = self
            .pool
            .iter()
            .filter(|signed| signed.transaction.from == *address)
            .count() as Nonce;
        included + pending
    }

    fn produce_block(&mut self) -> Block {
        let pool = std::mem::replace(&mut self.pool, Vec::new());
        let parent_hash = self.tip().hash;
        let number = self.tip().number + 1;
        let transactions = pool.iter().map(SignedTransaction::hash).collect::<Vec<_>>();
        let hash = Block::compute_hash(number, &parent_hash, &transactions);

        let receipts = pool
            .iter()
            .zip(transactions.iter())
            .map(|(signed, tx_hash)| {
                let (status, gas_used, contract_address) = self.apply(&signed.transaction);
                Receipt {
                    transaction_hash: *tx_hash,
                    block_number: number,
                    block_hash: hash,
                    status,
                    contract_address,
                    gas_used,
                }
            })
            .collect::<Vec<_>>();

        for receipt in &receipts {
            self.receipts
                .insert(receipt.transaction_hash, receipt.clone());
        }

        let block = Block {
            number,
            hash,
            parent_hash,
            transactions,
            receipts,
        };
        self.blocks.push(block.clone());
        log::debug!(
            "Emulator produced block {} with {} transactions",
            number,
            block.transactions.len()
        );

        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(block.clone()).is_ok());
        block
    }

    /// Apply the transaction to the account state.
    ///
    /// The sender nonce is consumed and the fee for the used gas is charged even if the
    /// transaction fails.
    fn apply(&mut self, tx: &Transaction) -> (ReceiptStatus, u64, Option<Address>) {
        let required_gas = intrinsic_gas(tx);
        let gas_used = required_gas.min(tx.gas_limit);
        let fee = tx.gas_price.saturating_mul(Balance::from(gas_used));
        let contract_address = tx.contract_address();
        let occupied = contract_address.map_or(false, |address| self.code.contains_key(&address));

        let sender = self.accounts.entry(tx.from).or_default();
        sender.nonce += 1;

        let cost = fee.checked_add(tx.value);
        let failure = if required_gas > tx.gas_limit {
            Some(FailureReason::OutOfGas)
        } else if cost.map_or(true, |cost| sender.balance < cost) {
            Some(FailureReason::InsufficientBalance)
        } else if occupied {
            Some(FailureReason::AddressOccupied)
        } else {
            None
        };

        let cost = match (failure, cost) {
            (None, Some(cost)) => cost,
            (reason, _) => {
                let reason = reason.unwrap_or(FailureReason::InsufficientBalance);
                sender.balance = sender.balance.saturating_sub(fee);
                return (ReceiptStatus::Failed(reason), gas_used, None);
            }
        };
        sender.balance -= cost;

        match tx.action {
            Action::Call(recipient) => {
                let recipient = self.accounts.entry(recipient).or_default();
                recipient.balance = recipient.balance.saturating_add(tx.value);
            }
            Action::Create => {
                if let Some(address) = contract_address {
                    self.code.insert(address, tx.data.clone());
                    let contract = self.accounts.entry(address).or_default();
                    contract.balance = contract.balance.saturating_add(tx.value);
                }
            }
        }
        (ReceiptStatus::Success, gas_used, contract_address)
    }
}

/// Gas a transaction uses independent of its gas limit.
fn intrinsic_gas(tx: &Transaction) -> u64 {
    let create = match tx.action {
        Action::Create => CREATE_GAS,
        Action::Call(_) => 0,
    };
    BASE_GAS + create + DATA_BYTE_GAS * tx.data.len() as u64
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::Backend as _;
    use futures::executor::block_on;
    use hub_core::{address_of, ed25519, CryptoPair as _};

    fn transaction(key: &ed25519::Pair, nonce: Nonce, action: Action) -> SignedTransaction {
        Transaction {
            from: address_of(&key.public()),
            nonce,
            gas_price: 1,
            gas_limit: 100_000,
            action,
            value: 10,
            data: Vec::new(),
        }
        .sign(key)
    }

    #[test]
    fn intrinsic_gas_counts_payload_and_creation() {
        let key = ed25519::Pair::from_seed(&[1u8; 32]);
        let mut tx = transaction(&key, 0, Action::Create).transaction;
        tx.data = vec![0u8; 10];
        assert_eq!(intrinsic_gas(&tx), BASE_GAS + CREATE_GAS + 10 * DATA_BYTE_GAS);
    }

    #[test]
    fn manual_mode_keeps_transactions_pending() {
        let key = ed25519::Pair::from_seed(&[2u8; 32]);
        let sender = address_of(&key.public());
        let emulator = Emulator::manual();
        emulator.mint(&sender, 1_000_000);

        block_on(emulator.submit(transaction(&key, 0, Action::Call(Address::zero())))).unwrap();
        block_on(emulator.submit(transaction(&key, 1, Action::Call(Address::zero())))).unwrap();
        assert_eq!(emulator.pending_count(), 2);
        assert_eq!(block_on(emulator.nonce(&sender)).unwrap(), 0);

        let block = emulator.produce_block();
        assert_eq!(block.number, 1);
        assert_eq!(block.receipts.len(), 2);
        assert!(block.receipts.iter().all(Receipt::is_success));
        assert_eq!(block_on(emulator.nonce(&sender)).unwrap(), 2);
        assert_eq!(block_on(emulator.balance(&Address::zero())).unwrap(), 20);
    }

    #[test]
    fn pending_transactions_count_towards_nonce() {
        let key = ed25519::Pair::from_seed(&[3u8; 32]);
        let emulator = Emulator::manual();

        block_on(emulator.submit(transaction(&key, 0, Action::Create))).unwrap();
        let result = block_on(emulator.submit(transaction(&key, 0, Action::Create)));
        match result {
            Err(Error::InvalidNonce {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn failed_transaction_consumes_nonce() {
        let key = ed25519::Pair::from_seed(&[4u8; 32]);
        let sender = address_of(&key.public());
        let emulator = Emulator::new();

        block_on(emulator.submit(transaction(&key, 0, Action::Call(Address::zero())))).unwrap();

        let block = block_on(emulator.block(1)).unwrap().unwrap();
        assert_eq!(
            block.receipts[0].status,
            ReceiptStatus::Failed(FailureReason::InsufficientBalance)
        );
        assert_eq!(block_on(emulator.nonce(&sender)).unwrap(), 1);
    }

    #[test]
    fn out_of_gas_charges_gas_limit() {
        let key = ed25519::Pair::from_seed(&[5u8; 32]);
        let sender = address_of(&key.public());
        let emulator = Emulator::new();
        emulator.mint(&sender, 1_000_000);

        let mut tx = transaction(&key, 0, Action::Call(Address::zero())).transaction;
        tx.gas_limit = 1_000;
        block_on(emulator.submit(tx.sign(&key))).unwrap();

        let block = emulator.block_at(1);
        let receipt = &block.receipts[0];
        assert_eq!(receipt.status, ReceiptStatus::Failed(FailureReason::OutOfGas));
        assert_eq!(receipt.gas_used, 1_000);
        assert_eq!(block_on(emulator.balance(&sender)).unwrap(), 999_000);
    }

    #[test]
    fn overflowing_cost_is_insufficient_balance() {
        let key = ed25519::Pair::from_seed(&[8u8; 32]);
        let sender = address_of(&key.public());
        let recipient = Address::repeat_byte(9);
        let emulator = Emulator::new();
        emulator.mint(&sender, Balance::max_value());

        let mut tx = transaction(&key, 0, Action::Call(recipient)).transaction;
        tx.value = Balance::max_value() - 10;
        let fee = Balance::from(intrinsic_gas(&tx)) * tx.gas_price;
        block_on(emulator.submit(tx.sign(&key))).unwrap();

        let block = emulator.block_at(1);
        let receipt = &block.receipts[0];
        assert_eq!(
            receipt.status,
            ReceiptStatus::Failed(FailureReason::InsufficientBalance)
        );
        assert_eq!(
            block_on(emulator.balance(&sender)).unwrap(),
            Balance::max_value() - fee
        );
        assert_eq!(block_on(emulator.balance(&recipient)).unwrap(), 0);
        assert_eq!(block_on(emulator.nonce(&sender)).unwrap(), 1);
    }

    #[test]
    fn unsigned_sender_is_rejected() {
        let key = ed25519::Pair::from_seed(&[6u8; 32]);
        let other = ed25519::Pair::from_seed(&[7u8; 32]);
        let mut tx = transaction(&key, 0, Action::Create).transaction;
        tx.from = address_of(&other.public());

        let result = block_on(Emulator::new().submit(tx.sign(&key)));
        assert!(matches!(result, Err(Error::InvalidTransaction(_))));
    }

    impl Emulator {
        fn block_at(&self, number: BlockNumber) -> Block {
            self.lock().blocks[number as usize].clone()
        }
    }
}
