//! Test doubles for the wallet and chain seams.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use chain_eth::abi::AbiParam;
use chain_eth::chains::ChainDescriptor;
use chain_eth::erc20::{ContractCall, BALANCE_OF_SELECTOR, DECIMALS_SELECTOR};

use crate::balance::ChainReader;
use crate::error::{ProviderError, ReadError};
use crate::provider::{
    AddChainParameters, Connection, Connector, ConnectorInfo, ProviderEvent, WalletProvider,
};

pub const ALICE: Address = address!("1000000000000000000000000000000000000001");
pub const BOB: Address = address!("2000000000000000000000000000000000000002");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    SwitchChain(u64),
    AddChain(AddChainParameters),
    Disconnect,
}

/// Records every request and answers from scripted results.
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<Vec<ProviderCall>>,
    switch_results: Mutex<VecDeque<Result<(), ProviderError>>>,
    add_error: Mutex<Option<ProviderError>>,
    disconnect_error: Mutex<Option<ProviderError>>,
}

impl MockProvider {
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Queues the answer to the next `switch_chain`; unqueued calls succeed.
    pub fn push_switch_result(&self, result: Result<(), ProviderError>) {
        self.switch_results.lock().unwrap().push_back(result);
    }

    pub fn fail_add_chain(&self, err: ProviderError) {
        *self.add_error.lock().unwrap() = Some(err);
    }

    pub fn fail_disconnect(&self, err: ProviderError) {
        *self.disconnect_error.lock().unwrap() = Some(err);
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.record(ProviderCall::SwitchChain(chain_id));
        self.switch_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn add_chain(&self, params: &AddChainParameters) -> Result<(), ProviderError> {
        self.record(ProviderCall::AddChain(params.clone()));
        match self.add_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.record(ProviderCall::Disconnect);
        match self.disconnect_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub struct MockConnector {
    info: ConnectorInfo,
    provider: Arc<MockProvider>,
    accounts: Vec<Address>,
    chain_id: u64,
    error: Mutex<Option<ProviderError>>,
    gate: Option<Arc<Notify>>,
    started: Notify,
    handshakes: AtomicUsize,
    events: Mutex<Option<mpsc::UnboundedReceiver<ProviderEvent>>>,
}

impl MockConnector {
    pub fn new(id: &str, accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            info: ConnectorInfo::new(id, id),
            provider: Arc::new(MockProvider::default()),
            accounts,
            chain_id,
            error: Mutex::new(None),
            gate: None,
            started: Notify::new(),
            handshakes: AtomicUsize::new(0),
            events: Mutex::new(None),
        }
    }

    /// Handshakes block until the returned gate is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn failing(self, err: ProviderError) -> Self {
        *self.error.lock().unwrap() = Some(err);
        self
    }

    pub fn clear_failure(&self) {
        self.error.lock().unwrap().take();
    }

    /// Attaches a provider event channel to the next connection.
    pub fn with_events(self) -> (Self, mpsc::UnboundedSender<ProviderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(rx);
        (self, tx)
    }

    pub fn provider(&self) -> Arc<MockProvider> {
        self.provider.clone()
    }

    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    /// Resolves once a handshake has begun.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn info(&self) -> ConnectorInfo {
        self.info.clone()
    }

    async fn connect(&self) -> Result<Connection, ProviderError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(Connection {
            provider: self.provider.clone(),
            accounts: self.accounts.clone(),
            chain_id: self.chain_id,
            events: self.events.lock().unwrap().take(),
        })
    }
}

/// In-memory chain state.
#[derive(Default)]
pub struct MockReader {
    native: Mutex<HashMap<(u64, Address), U256>>,
    token_balances: Mutex<HashMap<(Address, Address), U256>>,
    token_decimals: Mutex<HashMap<Address, u8>>,
    failure: Mutex<Option<ReadError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    started: Notify,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl MockReader {
    pub fn set_native(&self, chain_id: u64, owner: Address, amount: U256) {
        self.native.lock().unwrap().insert((chain_id, owner), amount);
    }

    pub fn set_token(&self, token: Address, owner: Address, amount: U256, decimals: u8) {
        self.token_balances.lock().unwrap().insert((token, owner), amount);
        self.token_decimals.lock().unwrap().insert(token, decimals);
    }

    pub fn fail_with(&self, err: ReadError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// The next native read blocks until the returned gate is notified.
    pub fn hold_native(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a native read has begun.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give sibling reads a chance to start.
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn word(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}

#[async_trait]
impl ChainReader for MockReader {
    async fn native_balance(
        &self,
        chain: &ChainDescriptor,
        owner: Address,
    ) -> Result<U256, ReadError> {
        self.started.notify_one();
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.enter().await?;
        Ok(self
            .native
            .lock()
            .unwrap()
            .get(&(chain.id, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn call(
        &self,
        _chain: &ChainDescriptor,
        call: &ContractCall,
    ) -> Result<Vec<u8>, ReadError> {
        self.enter().await?;
        match call.selector {
            BALANCE_OF_SELECTOR => {
                let Some(AbiParam::Address(owner)) = call.args.first() else {
                    return Err(ReadError::Unknown("balanceOf without owner".into()));
                };
                self.token_balances
                    .lock()
                    .unwrap()
                    .get(&(call.to, *owner))
                    .map(|v| word(*v))
                    .ok_or_else(|| ReadError::NotFound(format!("no token at {}", call.to)))
            }
            DECIMALS_SELECTOR => self
                .token_decimals
                .lock()
                .unwrap()
                .get(&call.to)
                .map(|d| word(U256::from(*d)))
                .ok_or_else(|| ReadError::NotFound(format!("no token at {}", call.to))),
            _ => Err(ReadError::Unknown("unexpected selector".into())),
        }
    }
}
