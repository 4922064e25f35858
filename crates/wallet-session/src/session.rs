//! Wallet session lifecycle.
//!
//! [`SessionManager`] is the only writer of the application's
//! [`WalletSession`]. Every transition happens under one mutex that is never
//! held across an `.await`, and produces at most one [`SessionEvent`] that is
//! fanned out to subscribers in transition order.
//!
//! ```text
//! disconnected --connect--> connecting --ok--> connected
//!                               |                 |
//!                               +--err--> errored +--disconnect / wallet ends--> disconnected
//! ```

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use alloy_primitives::Address;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WalletConfig;
use crate::error::{ConnectError, DisconnectError};
use crate::provider::{Connection, Connector, ConnectorInfo, ProviderEvent, WalletProvider};
use crate::types::{SessionChange, SessionEvent, SessionStatus, WalletSession};

/// Owns the application-wide [`WalletSession`] and the provider behind it.
///
/// Share it as `Arc<SessionManager>`; `connect` needs the `Arc` to bind the
/// provider's event pump to the manager.
pub struct SessionManager {
    connectors: Vec<Arc<dyn Connector>>,
    connect_timeout: Duration,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    session: WalletSession,
    provider: Option<Arc<dyn WalletProvider>>,
    /// Bumped whenever a pending handshake or live connection is abandoned.
    generation: u64,
    sequence: u64,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
    event_pump: Option<JoinHandle<()>>,
}

impl SessionState {
    /// Replaces the session and notifies subscribers of what changed.
    fn transition(&mut self, next: WalletSession) -> Option<SessionEvent> {
        let prev = std::mem::replace(&mut self.session, next);
        let next = &self.session;

        let mut changes = Vec::new();
        if prev.status != next.status {
            changes.push(SessionChange::Status(next.status));
        }
        if prev.address != next.address {
            changes.push(SessionChange::Address(next.address));
        }
        if prev.chain_id != next.chain_id {
            changes.push(SessionChange::Chain(next.chain_id));
        }
        if changes.is_empty() {
            return None;
        }

        self.sequence += 1;
        let event = SessionEvent {
            sequence: self.sequence,
            session: next.clone(),
            changes,
        };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        Some(event)
    }

    /// Drops the live connection, stopping its event pump.
    fn release_connection(&mut self) -> Option<Arc<dyn WalletProvider>> {
        self.generation += 1;
        if let Some(pump) = self.event_pump.take() {
            pump.abort();
        }
        self.provider.take()
    }

    fn apply_event(&mut self, event: ProviderEvent) -> Option<SessionEvent> {
        if self.session.status != SessionStatus::Connected {
            debug!(?event, status = ?self.session.status, "ignoring provider event");
            return None;
        }

        let (accounts, chain_id, ended) = match event {
            ProviderEvent::AccountsChanged(accounts) => (Some(accounts), None, false),
            ProviderEvent::ChainChanged(chain_id) => (None, Some(chain_id), false),
            ProviderEvent::Changed { accounts, chain_id } => (accounts, chain_id, false),
            ProviderEvent::Disconnect => (None, None, true),
        };

        if ended || accounts.as_ref().is_some_and(Vec::is_empty) {
            info!("wallet ended the session");
            self.release_connection();
            return self.transition(WalletSession::default());
        }

        let mut next = self.session.clone();
        if let Some(address) = accounts.and_then(|a| a.first().copied()) {
            next.address = Some(address);
        }
        if let Some(chain_id) = chain_id {
            next.chain_id = Some(chain_id);
        }
        let event = self.transition(next);
        if event.is_some() {
            debug!(
                address = ?self.session.address,
                chain_id = ?self.session.chain_id,
                "wallet changed account or chain"
            );
        }
        event
    }
}

type ConnectOutcome = Result<Connection, ConnectError>;

impl SessionManager {
    /// Offers `connectors` in the given order. Each handshake is bounded by
    /// `connect_timeout`.
    pub fn new(connectors: Vec<Arc<dyn Connector>>, connect_timeout: Duration) -> Self {
        Self {
            connectors,
            connect_timeout,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Keeps only the connectors the config enables, in the order given.
    pub fn from_config(connectors: Vec<Arc<dyn Connector>>, config: &WalletConfig) -> Self {
        let connectors = connectors
            .into_iter()
            .filter(|c| config.is_connector_enabled(&c.info().id))
            .collect();
        Self::new(connectors, config.connect_timeout())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connection strategies offered to the user.
    pub fn list_available_connectors(&self) -> Vec<ConnectorInfo> {
        self.connectors.iter().map(|c| c.info()).collect()
    }

    /// The current session.
    pub fn snapshot(&self) -> WalletSession {
        self.lock().session.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().session.status
    }

    /// The connected account and chain, if connected.
    pub fn active_pair(&self) -> Option<(Address, u64)> {
        self.lock().session.active_pair()
    }

    /// The active pair together with the sequence number of the session
    /// event that made it active. A pair that goes away and comes back is
    /// reported with a newer sequence.
    pub fn active_pair_epoch(&self) -> Option<((Address, u64), u64)> {
        let state = self.lock();
        state.session.active_pair().map(|pair| (pair, state.sequence))
    }

    /// The request interface of the connected wallet, if any.
    pub fn active_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        let state = self.lock();
        if state.session.is_connected() {
            state.provider.clone()
        } else {
            None
        }
    }

    /// Registers a subscriber for every subsequent session change.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        Subscription { receiver: rx }
    }

    /// Connects through the connector with id `connector_id`.
    ///
    /// Only one handshake runs at a time: a call made while `connecting`
    /// fails with [`ConnectError::AlreadyInProgress`]. Dropping the returned
    /// future before it resolves abandons the handshake and leaves the
    /// session `errored`.
    pub async fn connect(
        self: &Arc<Self>,
        connector_id: &str,
    ) -> Result<WalletSession, ConnectError> {
        let connector = self
            .connectors
            .iter()
            .find(|c| c.info().id == connector_id)
            .cloned()
            .ok_or_else(|| ConnectError::UnknownConnector(connector_id.to_string()))?;

        let pending = self.begin_connect(connector_id)?;
        info!(connector = connector_id, "connecting wallet");

        let outcome = match tokio::time::timeout(self.connect_timeout, connector.connect()).await {
            Err(_) => Err(ConnectError::Timeout(self.connect_timeout)),
            Ok(result) => result.map_err(ConnectError::from),
        };

        match self.finish_connect(connector_id, pending.settle(), outcome) {
            Ok(session) => Ok(session),
            Err((err, orphan)) => {
                if let Some(provider) = orphan {
                    if let Err(e) = provider.disconnect().await {
                        warn!(
                            connector = connector_id,
                            "failed to release abandoned connection: {e}"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    fn begin_connect<'a>(
        &'a self,
        connector_id: &'a str,
    ) -> Result<PendingConnect<'a>, ConnectError> {
        let mut state = self.lock();
        let status = state.session.status;
        if !status.accepts_connect() {
            return Err(match status {
                SessionStatus::Connecting => ConnectError::AlreadyInProgress,
                _ => ConnectError::AlreadyConnected,
            });
        }
        state.generation += 1;
        state.transition(WalletSession::connecting(connector_id));
        Ok(PendingConnect {
            manager: self,
            connector_id,
            generation: state.generation,
            settled: false,
        })
    }

    /// Applies a handshake result. On failure, also returns a provider that
    /// was connected but can no longer be used.
    fn finish_connect(
        self: &Arc<Self>,
        connector_id: &str,
        generation: u64,
        outcome: ConnectOutcome,
    ) -> Result<WalletSession, (ConnectError, Option<Arc<dyn WalletProvider>>)> {
        let mut state = self.lock();

        if state.generation != generation {
            debug!(connector = connector_id, "discarding superseded connection attempt");
            return Err((ConnectError::Cancelled, outcome.ok().map(|c| c.provider)));
        }

        let (connection, address) = match outcome {
            Ok(connection) => {
                let first = connection.accounts.first().copied();
                match first {
                    Some(address) => (connection, address),
                    None => {
                        state.transition(WalletSession::errored(
                            connector_id,
                            ConnectError::NoAccounts.to_string(),
                        ));
                        return Err((ConnectError::NoAccounts, Some(connection.provider)));
                    }
                }
            }
            Err(err) => {
                warn!(connector = connector_id, "wallet connection failed: {err}");
                state.transition(WalletSession::errored(connector_id, err.to_string()));
                return Err((err, None));
            }
        };

        let Connection {
            provider,
            chain_id,
            events,
            ..
        } = connection;

        state.provider = Some(provider);
        state.transition(WalletSession::connected(connector_id, address, chain_id));
        if let Some(events) = events {
            state.event_pump = Some(self.spawn_event_pump(generation, events));
        }
        info!(connector = connector_id, %address, chain_id, "wallet connected");

        Ok(state.session.clone())
    }

    /// Disconnects the session. Always ends `disconnected`; calling it while
    /// already disconnected does nothing.
    pub async fn disconnect(&self) -> Result<(), DisconnectError> {
        let provider = {
            let mut state = self.lock();
            if state.session.status == SessionStatus::Disconnected {
                return Ok(());
            }
            let provider = state.release_connection();
            state.transition(WalletSession::default());
            provider
        };
        info!("wallet disconnected");

        if let Some(provider) = provider {
            provider.disconnect().await.map_err(|e| {
                warn!("provider disconnect failed: {e}");
                DisconnectError::from(e)
            })?;
        }
        Ok(())
    }

    /// Applies a wallet-driven change to the current connection.
    ///
    /// Returns the emitted event, or `None` when nothing changed or no
    /// session is connected.
    pub fn apply_provider_event(&self, event: ProviderEvent) -> Option<SessionEvent> {
        self.lock().apply_event(event)
    }

    /// Applies `event` only while connection `generation` is still live.
    fn apply_for_generation(&self, generation: u64, event: ProviderEvent) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.apply_event(event);
        true
    }

    fn spawn_event_pump(
        self: &Arc<Self>,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<ProviderEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if !manager.apply_for_generation(generation, event) {
                    break;
                }
            }
            debug!(generation, "provider event stream closed");
        })
    }
}

/// A handshake between `begin_connect` and `finish_connect`.
///
/// If the `connect` future is dropped while the handshake is still pending,
/// the guard moves its generation to `errored` so later connects are not
/// refused with `AlreadyInProgress`.
struct PendingConnect<'a> {
    manager: &'a SessionManager,
    connector_id: &'a str,
    generation: u64,
    settled: bool,
}

impl PendingConnect<'_> {
    /// Hands the generation over to `finish_connect`.
    fn settle(mut self) -> u64 {
        self.settled = true;
        self.generation
    }
}

impl Drop for PendingConnect<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.manager.lock();
        if state.generation != self.generation {
            return;
        }
        warn!(connector = self.connector_id, "connection attempt abandoned by caller");
        state.generation += 1;
        state.transition(WalletSession::errored(
            self.connector_id,
            ConnectError::Abandoned.to_string(),
        ));
    }
}

/// Ordered stream of session changes. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Subscription {
    /// Waits for the next change.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Returns a change that has already been delivered, without waiting.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drains every change delivered so far.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Stops delivery. Same as dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl Stream for Subscription {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
