//! Shared doubles for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};
use wiremock::{Respond, ResponseTemplate};

use chain_eth::erc20::ContractCall;
use wallet_session::{
    AddChainParameters, ChainDescriptor, ChainReader, Connection, Connector, ConnectorInfo,
    ProviderError, ProviderEvent, ReadError, WalletProvider,
};

pub const ALICE: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
pub const BOB: Address = address!("3c44cdddb6a900fa2b585dd299e03d12fa4293bc");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Switch(u64),
    AddChain(AddChainParameters),
    Disconnect,
}

/// A wallet that records requests and can push change notifications.
pub struct TestWallet {
    requests: Mutex<Vec<Request>>,
    switch_error: Mutex<Option<ProviderError>>,
    events: mpsc::UnboundedSender<ProviderEvent>,
}

impl TestWallet {
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Makes the next switch request fail with `err`.
    pub fn fail_next_switch(&self, err: ProviderError) {
        *self.switch_error.lock().unwrap() = Some(err);
    }

    /// Pushes a notification the way a wallet does after user action.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for TestWallet {
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.requests.lock().unwrap().push(Request::Switch(chain_id));
        match self.switch_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn add_chain(&self, params: &AddChainParameters) -> Result<(), ProviderError> {
        self.requests.lock().unwrap().push(Request::AddChain(params.clone()));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.requests.lock().unwrap().push(Request::Disconnect);
        Ok(())
    }
}

/// An injected-style connector backed by one [`TestWallet`].
pub struct TestConnector {
    id: &'static str,
    account: Address,
    chain_id: u64,
    wallet: Arc<TestWallet>,
    pending_events: Mutex<Option<mpsc::UnboundedReceiver<ProviderEvent>>>,
    handshakes: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl TestConnector {
    pub fn new(id: &'static str, account: Address, chain_id: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id,
            account,
            chain_id,
            wallet: Arc::new(TestWallet {
                requests: Mutex::new(Vec::new()),
                switch_error: Mutex::new(None),
                events: tx,
            }),
            pending_events: Mutex::new(Some(rx)),
            handshakes: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Handshakes wait for the user to approve via the returned handle.
    pub fn awaiting_approval(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn wallet(&self) -> Arc<TestWallet> {
        self.wallet.clone()
    }

    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for TestConnector {
    fn info(&self) -> ConnectorInfo {
        ConnectorInfo::new(self.id, self.id)
    }

    async fn connect(&self) -> Result<Connection, ProviderError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(Connection {
            provider: self.wallet.clone(),
            accounts: vec![self.account],
            chain_id: self.chain_id,
            events: self.pending_events.lock().unwrap().take(),
        })
    }
}

/// Chain reader that answers native balances only, optionally holding the
/// next read until released.
#[derive(Default)]
pub struct SlowReader {
    balances: Mutex<Vec<((u64, Address), U256)>>,
    hold: Mutex<Option<Arc<Notify>>>,
    started: Notify,
    calls: AtomicUsize,
}

impl SlowReader {
    pub fn set_balance(&self, chain_id: u64, owner: Address, amount: U256) {
        self.balances.lock().unwrap().push(((chain_id, owner), amount));
    }

    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub async fn read_started(&self) {
        self.started.notified().await;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for SlowReader {
    async fn native_balance(
        &self,
        chain: &ChainDescriptor,
        owner: Address,
    ) -> Result<U256, ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        let hold = self.hold.lock().unwrap().take();
        if let Some(gate) = hold {
            gate.notified().await;
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| *key == (chain.id, owner))
            .map(|(_, amount)| *amount)
            .unwrap_or(U256::ZERO))
    }

    async fn call(
        &self,
        chain: &ChainDescriptor,
        call: &ContractCall,
    ) -> Result<Vec<u8>, ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ReadError::NotFound(format!("no contract at {} on chain {}", call.to, chain.id)))
    }
}

/// JSON-RPC success reply that echoes the request id.
pub struct RpcResult(String);

pub fn rpc_result(result: String) -> RpcResult {
    RpcResult(result)
}

impl Respond for RpcResult {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let id = request
            .body_json::<Value>()
            .ok()
            .and_then(|body| body.get("id").cloned())
            .unwrap_or(json!(0));
        ResponseTemplate::new(200)
            .set_body_json(json!({ "jsonrpc": "2.0", "id": id, "result": self.0 }))
    }
}
