use std::sync::Arc;

use tracing::{info, warn};

use chain_eth::chains::{ChainDescriptor, ChainRegistry};

use crate::error::SwitchError;
use crate::provider::AddChainParameters;
use crate::session::SessionManager;
use crate::types::ChainSwitchRequest;

/// How a successful switch request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The wallet moved to the chain.
    Switched,
    /// The wallet did not know the chain and has now registered it. The
    /// switch itself is not re-issued; the user selects the chain again.
    Registered,
}

/// Asks the connected wallet to move to another chain.
pub struct ChainSwitchCoordinator {
    session: Arc<SessionManager>,
    registry: Arc<ChainRegistry>,
}

impl ChainSwitchCoordinator {
    /// Switches through the wallet of `session`, registering chains from `registry`.
    pub fn new(session: Arc<SessionManager>, registry: Arc<ChainRegistry>) -> Self {
        Self { session, registry }
    }

    /// Switches to a configured chain by id.
    pub async fn switch_to(
        &self,
        request: ChainSwitchRequest,
    ) -> Result<SwitchOutcome, SwitchError> {
        let chain = self
            .registry
            .resolve(request.chain_id)
            .map_err(|_| SwitchError::UnsupportedChain(request.chain_id))?;
        self.switch_chain(chain).await
    }

    /// Requests a switch to `chain`, registering it with the wallet when the
    /// wallet reports it as unrecognized.
    ///
    /// Session state is not touched here; the wallet's own chain change
    /// notification updates it.
    pub async fn switch_chain(
        &self,
        chain: &ChainDescriptor,
    ) -> Result<SwitchOutcome, SwitchError> {
        let provider = self.session.active_provider().ok_or(SwitchError::NoProvider)?;

        let err = match provider.switch_chain(chain.id).await {
            Ok(()) => {
                info!(chain_id = chain.id, "wallet switched chain");
                return Ok(SwitchOutcome::Switched);
            }
            Err(err) if err.is_unrecognized_chain() => err,
            Err(err) => {
                warn!(chain_id = chain.id, code = err.code, "chain switch failed: {}", err.message);
                return Err(SwitchError::Provider(err));
            }
        };

        info!(chain_id = chain.id, code = err.code, "wallet does not know chain, registering it");
        provider
            .add_chain(&AddChainParameters::from(chain))
            .await
            .map_err(|e| {
                warn!(
                    chain_id = chain.id,
                    code = e.code,
                    "chain registration failed: {}",
                    e.message
                );
                SwitchError::Registration(e)
            })?;

        Ok(SwitchOutcome::Registered)
    }
}
