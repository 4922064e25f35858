//! [`ChainReader`] over HTTP JSON-RPC, using alloy's provider.

use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{BlockId, TransactionInput, TransactionRequest};
use alloy_transport::TransportResult;
use async_trait::async_trait;
use tracing::{debug, warn};

use chain_eth::chains::ChainDescriptor;
use chain_eth::erc20::ContractCall;

use crate::balance::ChainReader;
use crate::config::WalletConfig;
use crate::error::ReadError;

/// Reads chain state from each chain's primary RPC endpoint.
///
/// A provider is built for an endpoint on first use and reused afterwards.
/// Every request is bounded by `timeout`; hitting it is a network error.
pub struct JsonRpcReader {
    timeout: Duration,
    providers: Mutex<HashMap<String, DynProvider>>,
}

impl JsonRpcReader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Uses the configured RPC timeout.
    pub fn from_config(config: &WalletConfig) -> Self {
        Self::new(config.rpc_timeout())
    }

    fn provider(&self, chain: &ChainDescriptor) -> Result<DynProvider, ReadError> {
        let url = chain
            .rpc_url()
            .ok_or_else(|| ReadError::NotFound(format!("no RPC endpoint for chain {}", chain.id)))?;

        let mut providers = self.providers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(provider) = providers.get(url) {
            return Ok(provider.clone());
        }

        let parsed: reqwest::Url = url
            .parse()
            .map_err(|e| ReadError::Unknown(format!("invalid RPC URL {url}: {e}")))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(parsed)
            .erased();
        debug!(chain_id = chain.id, url, "rpc provider created");
        providers.insert(url.to_string(), provider.clone());
        Ok(provider)
    }

    async fn send<T, F>(
        &self,
        chain: &ChainDescriptor,
        method: &str,
        request: F,
    ) -> Result<T, ReadError>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        debug!(chain_id = chain.id, method, "rpc request");
        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => {
                warn!(chain_id = chain.id, method, timeout = ?self.timeout, "rpc timed out");
                Err(ReadError::Network(format!("{method}: timed out after {:?}", self.timeout)))
            }
            Ok(Err(e)) => {
                warn!(chain_id = chain.id, method, "rpc request failed: {e}");
                Err(e.into())
            }
            Ok(Ok(value)) => Ok(value),
        }
    }
}

#[async_trait]
impl ChainReader for JsonRpcReader {
    async fn native_balance(
        &self,
        chain: &ChainDescriptor,
        owner: Address,
    ) -> Result<U256, ReadError> {
        let provider = self.provider(chain)?;
        self.send(chain, "eth_getBalance", provider.get_balance(owner)).await
    }

    async fn call(
        &self,
        chain: &ChainDescriptor,
        call: &ContractCall,
    ) -> Result<Vec<u8>, ReadError> {
        let provider = self.provider(chain)?;
        let request = TransactionRequest::default()
            .to(call.to)
            .input(TransactionInput::both(Bytes::from(call.calldata())));

        let data = self
            .send(chain, "eth_call", provider.call(request).block(BlockId::latest()))
            .await?;
        if data.is_empty() {
            return Err(ReadError::NotFound(format!(
                "no contract at {} on chain {}",
                call.to, chain.id
            )));
        }
        Ok(data.to_vec())
    }
}
