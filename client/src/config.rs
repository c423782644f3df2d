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

//! Provides [ChainConfig].
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error as ThisError;

use hub_core::{Address, Balance};

/// Gas price used for transactions that do not set one.
pub const DEFAULT_GAS_PRICE: Balance = 1;

/// Gas limit used for transactions that do not set one.
pub const DEFAULT_GAS_LIMIT: u64 = 7_500_000;

pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:9933";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Settings for connecting to a ledger and for building transactions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainConfig {
    /// URL of the JSON-RPC endpoint of the remote node.
    pub node_url: String,
    pub gas_price: Balance,
    pub gas_limit: u64,
    /// How often the remote node is asked for new blocks.
    pub poll_interval_ms: u64,
    /// Whether the emulator produces a block for every submitted transaction.
    pub auto_mine: bool,
    /// Initial balances of the emulator.
    pub genesis: Vec<GenesisAccount>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenesisAccount {
    /// Hex encoded address, optionally `0x` prefixed.
    pub address: String,
    pub balance: Balance,
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Cannot read config file '{1}'")]
    CannotRead(#[source] std::io::Error, PathBuf),

    #[error("Malformed config file")]
    Deserialization(#[from] serde_json::Error),

    #[error("Invalid genesis address '{0}'")]
    InvalidAddress(String),
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            node_url: DEFAULT_NODE_URL.to_string(),
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            auto_mine: true,
            genesis: Vec::new(),
        }
    }
}

impl ChainConfig {
    /// Read the configuration from a JSON file. Missing fields take their default value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file =
            File::open(path).map_err(|err| ConfigError::CannotRead(err, path.to_path_buf()))?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn genesis_balances(&self) -> Result<Vec<(Address, Balance)>, ConfigError> {
        self.genesis
            .iter()
            .map(|account| Ok((parse_address(&account.address)?, account.balance)))
            .collect()
    }
}

fn parse_address(encoded: &str) -> Result<Address, ConfigError> {
    let bytes = hex::decode(encoded.trim_start_matches("0x"))
        .map_err(|_| ConfigError::InvalidAddress(encoded.to_string()))?;
    if bytes.len() != Address::len_bytes() {
        return Err(ConfigError::InvalidAddress(encoded.to_string()));
    }
    Ok(Address::from_slice(&bytes))
}
