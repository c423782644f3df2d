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

//! [backend::Backend] implementation for a remote node that speaks JSON-RPC.
//!
//! All payloads are SCALE encoded and passed as `0x` prefixed hex strings. A `null` response
//! means the requested item does not exist.
use futures::stream::{self, BoxStream, StreamExt as _};
use jsonrpc_core::Params;
use jsonrpc_core_client::{transports::http, RawClient};
use parity_scale_codec::{Decode, Encode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::backend;
use crate::{ChainConfig, Error};
use hub_core::{Address, Balance, Block, BlockNumber, Nonce, Receipt, SignedTransaction, TxHash};

/// Sends JSON-RPC requests to a node.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    /// Call `method` with positional `params` and return the result value.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, Error>;
}

/// [RpcTransport] over HTTP.
///
/// Requests run on a [tokio::runtime::Runtime] owned by the transport so callers can use any
/// executor.
#[derive(Clone)]
pub struct HttpTransport {
    client: RawClient,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl HttpTransport {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::Other(format!("Failed to start RPC runtime: {}", err)))?;
        let url = url.to_owned();
        let client = runtime
            .spawn(async move { http::connect::<RawClient>(&url).await })
            .await
            .map_err(|err| Error::Rpc(err.to_string()))??;
        Ok(HttpTransport {
            client,
            runtime: Arc::new(runtime),
        })
    }
}

#[async_trait::async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, Error> {
        let client = self.client.clone();
        let method = method.to_owned();
        let value = self
            .runtime
            .spawn(async move { client.call_method(&method, Params::Array(params)).await })
            .await
            .map_err(|err| Error::Rpc(err.to_string()))??;
        Ok(value)
    }
}

#[derive(Clone)]
pub struct RemoteNode {
    transport: Arc<dyn RpcTransport>,
    poll_interval: Duration,
    /// Tip of the chain when the node was connected. [backend::Backend::blocks] streams the
    /// blocks after it.
    connected_at: BlockNumber,
}

impl RemoteNode {
    /// Connect to the node at [ChainConfig::node_url] over HTTP.
    pub async fn create(config: &ChainConfig) -> Result<Self, Error> {
        let transport = HttpTransport::connect(&config.node_url).await?;
        let node = Self::connect(Arc::new(transport), config.poll_interval()).await?;
        log::info!(
            "Connected to node at {} with chain tip {}",
            config.node_url,
            node.connected_at
        );
        Ok(node)
    }

    /// Create a node that uses `transport` and polls for new blocks every `poll_interval`.
    pub async fn connect(
        transport: Arc<dyn RpcTransport>,
        poll_interval: Duration,
    ) -> Result<Self, Error> {
        let mut node = RemoteNode {
            transport,
            poll_interval,
            connected_at: 0,
        };
        node.connected_at = node.tip_number().await?;
        Ok(node)
    }

    async fn request<T: Decode>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>, Error> {
        let value = self.transport.call(method, params).await?;
        decode_value(value)
    }

    async fn request_required<T: Decode>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, Error> {
        self.request(method, params)
            .await?
            .ok_or_else(|| Error::Rpc(format!("{} returned null", method)))
    }

    /// Fetch block `next` and advance `next` if the node has the block already.
    async fn poll_block(&self, next: &mut BlockNumber) -> Result<Option<Block>, Error> {
        if *next > self.tip_number().await? {
            return Ok(None);
        }
        let block = self.fetch_block(*next).await?;
        if block.is_some() {
            *next += 1;
        }
        Ok(block)
    }

    async fn tip_number(&self) -> Result<BlockNumber, Error> {
        self.request_required("chain_blockNumber", vec![]).await
    }

    async fn fetch_block(&self, number: BlockNumber) -> Result<Option<Block>, Error> {
        self.request("chain_getBlock", vec![Value::from(number)])
            .await
    }
}

#[async_trait::async_trait]
impl backend::Backend for RemoteNode {
    async fn submit(&self, transaction: SignedTransaction) -> Result<(), Error> {
        let tx_hash = transaction.hash();
        let returned: TxHash = self
            .request_required("chain_submitTransaction", vec![encode_param(&transaction)])
            .await?;
        if returned != tx_hash {
            return Err(Error::Rpc(format!(
                "Node returned hash {:?} for transaction {:?}",
                returned, tx_hash
            )));
        }
        Ok(())
    }

    async fn balance(&self, address: &Address) -> Result<Balance, Error> {
        self.request_required("chain_getBalance", vec![encode_param(address)])
            .await
    }

    async fn nonce(&self, address: &Address) -> Result<Nonce, Error> {
        self.request_required("chain_getNonce", vec![encode_param(address)])
            .await
    }

    async fn code(&self, address: &Address) -> Result<Option<Vec<u8>>, Error> {
        self.request("chain_getCode", vec![encode_param(address)])
            .await
    }

    async fn transaction(&self, tx_hash: &TxHash) -> Result<Option<SignedTransaction>, Error> {
        self.request("chain_getTransaction", vec![encode_param(tx_hash)])
            .await
    }

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, Error> {
        self.request("chain_getReceipt", vec![encode_param(tx_hash)])
            .await
    }

    async fn block(&self, number: BlockNumber) -> Result<Option<Block>, Error> {
        self.fetch_block(number).await
    }

    async fn block_number(&self) -> Result<BlockNumber, Error> {
        self.tip_number().await
    }

    fn blocks(&self) -> BoxStream<'static, Block> {
        let node = self.clone();
        let next = self.connected_at + 1;
        stream::unfold((node, next), |(node, mut next)| async move {
            loop {
                match node.poll_block(&mut next).await {
                    Ok(Some(block)) => return Some((block, (node, next))),
                    Ok(None) => {}
                    Err(err) => log::warn!("Polling for new blocks failed: {}", err),
                }
                async_std::task::sleep(node.poll_interval).await;
            }
        })
        .boxed()
    }
}

/// Encode a value as a `0x` prefixed hex string of its SCALE encoding.
pub fn encode_param<T: Encode + ?Sized>(value: &T) -> Value {
    Value::String(format!("0x{}", hex::encode(value.encode())))
}

/// Decode a response value produced by [encode_param]. `null` decodes to `None`.
pub fn decode_value<T: Decode>(value: Value) -> Result<Option<T>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::String(encoded) => {
            let bytes = hex::decode(encoded.trim_start_matches("0x"))
                .map_err(|err| Error::Rpc(format!("Invalid hex in response: {}", err)))?;
            Ok(Some(T::decode(&mut &bytes[..])?))
        }
        other => Err(Error::Rpc(format!("Unexpected response value {}", other))),
    }
}
