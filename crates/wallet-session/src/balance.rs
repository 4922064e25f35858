//! Balance reads for the active account.
//!
//! [`BalanceReader`] performs one read cycle against a [`ChainReader`].
//! [`BalanceTracker`] owns what the presentation layer displays and guards it
//! against results that arrive after the session moved to another account or
//! chain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tracing::{debug, warn};

use chain_eth::chains::{ChainDescriptor, ChainRegistry};
use chain_eth::erc20::{self, ContractCall};
use chain_eth::units::format_units;
use chain_eth::EthError;

use crate::error::ReadError;
use crate::session::SessionManager;
use crate::types::{BalanceSnapshot, NativeBalance, TokenBalance};

/// Read-only access to chain state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn native_balance(
        &self,
        chain: &ChainDescriptor,
        owner: Address,
    ) -> Result<U256, ReadError>;

    /// Executes a read-only contract call and returns the raw return data.
    async fn call(
        &self,
        chain: &ChainDescriptor,
        call: &ContractCall,
    ) -> Result<Vec<u8>, ReadError>;
}

/// Performs balance read cycles for any `(address, chain_id)` pair.
///
/// Each cycle gets a sequence number from a shared counter, so snapshots can
/// be ordered by issue time.
pub struct BalanceReader {
    registry: Arc<ChainRegistry>,
    reader: Arc<dyn ChainReader>,
    sequence: AtomicU64,
}

impl BalanceReader {
    pub fn new(registry: Arc<ChainRegistry>, reader: Arc<dyn ChainReader>) -> Self {
        Self {
            registry,
            reader,
            sequence: AtomicU64::new(0),
        }
    }

    /// Reads the native balance and, when the chain has a stablecoin, the
    /// token balance of `address` on `chain_id`.
    pub async fn read_balances(
        &self,
        address: Address,
        chain_id: u64,
    ) -> Result<BalanceSnapshot, ReadError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let chain = self.registry.resolve(chain_id)?;
        debug!(%address, chain_id, sequence, "reading balances");

        let native = self.reader.native_balance(chain, address);
        let token = async {
            match chain.stablecoin {
                Some(token) => self.read_token(chain, token, address).await.map(Some),
                None => Ok(None),
            }
        };
        let (raw, token) = futures::try_join!(native, token).map_err(|e| {
            warn!(%address, chain_id, "balance read failed: {e}");
            e
        })?;

        let currency = &chain.native_currency;
        Ok(BalanceSnapshot {
            address,
            chain_id,
            native: NativeBalance {
                raw,
                formatted: format_units(raw, currency.decimals)?,
                symbol: currency.symbol.clone(),
                decimals: currency.decimals,
            },
            token,
            sequence,
        })
    }

    async fn read_token(
        &self,
        chain: &ChainDescriptor,
        token: Address,
        owner: Address,
    ) -> Result<TokenBalance, ReadError> {
        let (raw, decimals) = futures::try_join!(
            self.read_call(chain, erc20::balance_of(token, owner), erc20::decode_balance),
            self.read_call(chain, erc20::decimals(token), erc20::decode_decimals),
        )?;

        Ok(TokenBalance {
            token,
            raw,
            formatted: format_units(raw, decimals)?,
            decimals,
        })
    }

    async fn read_call<T>(
        &self,
        chain: &ChainDescriptor,
        call: ContractCall,
        decode: fn(&[u8]) -> Result<T, EthError>,
    ) -> Result<T, ReadError> {
        let data = self.reader.call(chain, &call).await?;
        Ok(decode(&data)?)
    }
}

/// Result of [`BalanceTracker::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot is now visible.
    Applied(BalanceSnapshot),
    /// The session moved on, or a newer snapshot was already visible.
    Stale,
    NoSession,
}

/// Visible balance state for the current session.
///
/// A snapshot is tied to the session epoch it was read in. Once the active
/// pair changes it is dropped, even if the session later returns to the same
/// account and chain.
pub struct BalanceTracker {
    session: Arc<SessionManager>,
    reader: Arc<BalanceReader>,
    visible: Mutex<Option<Visible>>,
}

struct Visible {
    epoch: u64,
    snapshot: BalanceSnapshot,
}

impl BalanceTracker {
    pub fn new(session: Arc<SessionManager>, reader: Arc<BalanceReader>) -> Self {
        Self {
            session,
            reader,
            visible: Mutex::new(None),
        }
    }

    /// Reads balances for the pair active right now.
    ///
    /// Errors are returned only while their pair is still active; anything
    /// that resolves after the pair changed is dropped as `Stale`.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ReadError> {
        let Some(((address, chain_id), epoch)) = self.session.active_pair_epoch() else {
            self.clear();
            return Ok(RefreshOutcome::NoSession);
        };

        let result = self.reader.read_balances(address, chain_id).await;

        if self.session.active_pair_epoch() != Some(((address, chain_id), epoch)) {
            debug!(%address, chain_id, "discarding balance read for inactive account");
            return Ok(RefreshOutcome::Stale);
        }
        let snapshot = result?;

        let mut visible = self.visible.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = visible.as_ref().filter(|v| v.epoch == epoch) {
            if current.snapshot.sequence > snapshot.sequence {
                debug!(
                    sequence = snapshot.sequence,
                    visible = current.snapshot.sequence,
                    "discarding out-of-order balance read"
                );
                return Ok(RefreshOutcome::Stale);
            }
        }
        *visible = Some(Visible {
            epoch,
            snapshot: snapshot.clone(),
        });
        Ok(RefreshOutcome::Applied(snapshot))
    }

    /// The displayed snapshot, if it was read for the current session epoch.
    /// A snapshot from an earlier epoch is discarded here.
    pub fn visible(&self) -> Option<BalanceSnapshot> {
        let active = self.session.active_pair_epoch();
        let mut visible = self.visible.lock().unwrap_or_else(PoisonError::into_inner);
        let current = visible.as_ref()?;
        match active {
            Some((pair, epoch)) if epoch == current.epoch && pair == current.snapshot.pair() => {
                Some(current.snapshot.clone())
            }
            _ => {
                debug!("dropping balance snapshot from a previous session epoch");
                *visible = None;
                None
            }
        }
    }

    fn clear(&self) {
        self.visible.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
