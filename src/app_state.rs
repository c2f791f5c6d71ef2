//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::OperatorPolicy;
use crate::domain::{EventBus, RandomSource, ResultSigner};
use crate::persistence::StoreBackend;
use crate::service::{CampaignService, ClaimService, SpinService};
use crate::transfer::NftTransfer;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Campaign catalogue and administration.
    pub campaign_service: Arc<CampaignService<StoreBackend>>,
    /// Eligibility, spins and history.
    pub spin_service: Arc<SpinService<StoreBackend>>,
    /// Prize claims.
    pub claim_service: Arc<ClaimService<StoreBackend>>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires the services over one store.
    #[must_use]
    pub fn new(
        store: Arc<StoreBackend>,
        event_bus: EventBus,
        signer: ResultSigner,
        random: Arc<dyn RandomSource>,
        transfer: Arc<dyn NftTransfer>,
        operators: Arc<dyn OperatorPolicy>,
    ) -> Self {
        Self {
            campaign_service: Arc::new(CampaignService::new(
                Arc::clone(&store),
                event_bus.clone(),
                operators,
            )),
            spin_service: Arc::new(SpinService::new(
                Arc::clone(&store),
                event_bus.clone(),
                signer.clone(),
                random,
            )),
            claim_service: Arc::new(ClaimService::new(
                store,
                event_bus.clone(),
                signer,
                transfer,
            )),
            event_bus,
        }
    }
}
