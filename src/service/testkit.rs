//! Test doubles shared by the service tests.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::auth::StaticOperatorList;
use crate::domain::{
    Campaign, CampaignDraft, CampaignId, EventBus, InventoryId, PrizeDefinition,
    PrizeInventoryItem, RandomSource, ResultSigner, SpinBudget, SpinHistory, SpinHistoryId,
    SpinStatus, WhitelistEntry,
};
use crate::error::SpinError;
use crate::persistence::{CampaignStats, CampaignStore, InMemoryStore, SpinConsumption};
use crate::transfer::{NftTransfer, TransferError, TransferReceipt, TransferRequest};

use super::{CampaignService, ClaimService, SpinService};

pub(crate) const OPERATOR: &str = "0xoperator";

/// Transfer double that counts invocations and can be told to fail.
#[derive(Debug, Default)]
pub(crate) struct CountingTransfer {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl NftTransfer for CountingTransfer {
    fn transfer<'a>(
        &'a self,
        request: &'a TransferRequest,
    ) -> BoxFuture<'a, Result<TransferReceipt, TransferError>> {
        async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransferError::Transport("relay down".to_string()));
            }
            Ok(TransferReceipt {
                tx_hash: format!("0xtx-{}-{n}", request.token_id),
            })
        }
        .boxed()
    }
}

/// In-memory store whose successful history writes and claim completions
/// can be made to fail.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_history: AtomicBool,
    pub fail_complete_claim: AtomicBool,
}

impl CampaignStore for FlakyStore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        self.inner.insert_campaign(campaign).await
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        self.inner.update_campaign(campaign).await
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, SpinError> {
        self.inner.get_campaign(id).await
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, SpinError> {
        self.inner.list_campaigns().await
    }

    async fn upsert_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        spins_allowed: u32,
        now: DateTime<Utc>,
    ) -> Result<WhitelistEntry, SpinError> {
        self.inner
            .upsert_whitelist_entry(campaign_id, wallet_address, spins_allowed, now)
            .await
    }

    async fn remove_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<bool, SpinError> {
        self.inner
            .remove_whitelist_entry(campaign_id, wallet_address)
            .await
    }

    async fn get_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<Option<WhitelistEntry>, SpinError> {
        self.inner.get_whitelist_entry(campaign_id, wallet_address).await
    }

    async fn wallet_spins_used(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<u32, SpinError> {
        self.inner.wallet_spins_used(campaign_id, wallet_address).await
    }

    async fn consume_spin(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        budget: SpinBudget,
    ) -> Result<SpinConsumption, SpinError> {
        self.inner
            .consume_spin(campaign_id, wallet_address, budget)
            .await
    }

    async fn add_inventory(&self, items: &[PrizeInventoryItem]) -> Result<(), SpinError> {
        self.inner.add_inventory(items).await
    }

    async fn reserve_inventory(
        &self,
        campaign_id: CampaignId,
        nft_id: &str,
        wallet_address: &str,
        spin_id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        self.inner
            .reserve_inventory(campaign_id, nft_id, wallet_address, spin_id, now)
            .await
    }

    async fn get_inventory_item(
        &self,
        id: InventoryId,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        self.inner.get_inventory_item(id).await
    }

    async fn list_stale_reservations(
        &self,
        campaign_id: CampaignId,
        before: DateTime<Utc>,
    ) -> Result<Vec<PrizeInventoryItem>, SpinError> {
        self.inner.list_stale_reservations(campaign_id, before).await
    }

    async fn insert_spin_history(&self, spin: &SpinHistory) -> Result<(), SpinError> {
        if spin.status != SpinStatus::Failed && self.fail_history.load(Ordering::SeqCst) {
            return Err(SpinError::Persistence("history table unavailable".to_string()));
        }
        self.inner.insert_spin_history(spin).await
    }

    async fn get_spin_history(&self, id: SpinHistoryId) -> Result<Option<SpinHistory>, SpinError> {
        self.inner.get_spin_history(id).await
    }

    async fn list_spin_history(
        &self,
        campaign_id: CampaignId,
        wallet_address: Option<&str>,
        status: Option<SpinStatus>,
    ) -> Result<Vec<SpinHistory>, SpinError> {
        self.inner
            .list_spin_history(campaign_id, wallet_address, status)
            .await
    }

    async fn begin_claim(&self, id: SpinHistoryId, now: DateTime<Utc>) -> Result<bool, SpinError> {
        self.inner.begin_claim(id, now).await
    }

    async fn complete_claim(
        &self,
        id: SpinHistoryId,
        inventory_id: InventoryId,
        wallet_address: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        if self.fail_complete_claim.load(Ordering::SeqCst) {
            return Err(SpinError::Persistence("claim write timed out".to_string()));
        }
        self.inner
            .complete_claim(id, inventory_id, wallet_address, tx_hash, now)
            .await
    }

    async fn fail_claim(
        &self,
        id: SpinHistoryId,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        self.inner.fail_claim(id, error_message, now).await
    }

    async fn campaign_stats(&self, campaign_id: CampaignId) -> Result<CampaignStats, SpinError> {
        self.inner.campaign_stats(campaign_id).await
    }
}

/// The three services wired over one store.
#[derive(Debug)]
pub(crate) struct Harness {
    pub store: Arc<FlakyStore>,
    pub transfer: Arc<CountingTransfer>,
    pub campaigns: CampaignService<FlakyStore>,
    pub spins: SpinService<FlakyStore>,
    pub claims: ClaimService<FlakyStore>,
    pub events: EventBus,
}

impl Harness {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        let store = Arc::new(FlakyStore::default());
        let transfer = Arc::new(CountingTransfer::default());
        let events = EventBus::new(1_000);
        let signer = ResultSigner::new("test-secret");
        let operators = Arc::new(StaticOperatorList::from_csv(OPERATOR));

        let campaigns = CampaignService::new(Arc::clone(&store), events.clone(), operators);
        let spins = SpinService::new(
            Arc::clone(&store),
            events.clone(),
            signer.clone(),
            random,
        );
        let transfer_dyn: Arc<dyn NftTransfer> = Arc::clone(&transfer) as Arc<dyn NftTransfer>;
        let claims = ClaimService::new(Arc::clone(&store), events.clone(), signer, transfer_dyn);

        Self {
            store,
            transfer,
            campaigns,
            spins,
            claims,
            events,
        }
    }

    /// Creates a campaign through the admin service.
    pub async fn campaign(&self, draft: CampaignDraft) -> Campaign {
        let Ok(campaign) = self.campaigns.create_campaign(Some(OPERATOR), draft).await else {
            panic!("campaign creation failed");
        };
        campaign
    }
}

pub(crate) fn message(label: &str, probability: f64) -> PrizeDefinition {
    PrizeDefinition::Message {
        label: label.to_string(),
        probability,
        message: None,
    }
}

pub(crate) fn nft(label: &str, nft_id: &str, probability: f64) -> PrizeDefinition {
    PrizeDefinition::Nft {
        label: label.to_string(),
        probability,
        nft_id: nft_id.to_string(),
        fallback_message: format!("{label} is sold out"),
    }
}

pub(crate) fn draft(prizes: Vec<PrizeDefinition>, spins_per_wallet: u32) -> CampaignDraft {
    CampaignDraft {
        name: "Launch week".to_string(),
        description: "Spin to win".to_string(),
        active: true,
        start_date: Utc::now() - Duration::hours(1),
        end_date: Some(Utc::now() + Duration::days(7)),
        spins_per_wallet,
        require_whitelist: false,
        prizes,
    }
}
