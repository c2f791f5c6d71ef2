//! Runtime selection between the store implementations.

use chrono::{DateTime, Utc};

use super::models::{CampaignStats, SpinConsumption};
use super::{CampaignStore, InMemoryStore, PostgresStore};
use crate::domain::{
    Campaign, CampaignId, InventoryId, PrizeInventoryItem, SpinBudget, SpinHistory,
    SpinHistoryId, SpinStatus, WhitelistEntry,
};
use crate::error::SpinError;

/// The store chosen by `STORE_BACKEND` at startup.
#[derive(Debug)]
pub enum StoreBackend {
    /// Process-local state.
    Memory(InMemoryStore),
    /// PostgreSQL.
    Postgres(PostgresStore),
}

impl StoreBackend {
    /// Returns the configuration name of the backend.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            StoreBackend::Memory($store) => $call.await,
            StoreBackend::Postgres($store) => $call.await,
        }
    };
}

impl CampaignStore for StoreBackend {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        delegate!(self, s => s.insert_campaign(campaign))
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        delegate!(self, s => s.update_campaign(campaign))
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, SpinError> {
        delegate!(self, s => s.get_campaign(id))
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, SpinError> {
        delegate!(self, s => s.list_campaigns())
    }

    async fn upsert_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        spins_allowed: u32,
        now: DateTime<Utc>,
    ) -> Result<WhitelistEntry, SpinError> {
        delegate!(self, s => s.upsert_whitelist_entry(campaign_id, wallet_address, spins_allowed, now))
    }

    async fn remove_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<bool, SpinError> {
        delegate!(self, s => s.remove_whitelist_entry(campaign_id, wallet_address))
    }

    async fn get_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<Option<WhitelistEntry>, SpinError> {
        delegate!(self, s => s.get_whitelist_entry(campaign_id, wallet_address))
    }

    async fn wallet_spins_used(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<u32, SpinError> {
        delegate!(self, s => s.wallet_spins_used(campaign_id, wallet_address))
    }

    async fn consume_spin(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        budget: SpinBudget,
    ) -> Result<SpinConsumption, SpinError> {
        delegate!(self, s => s.consume_spin(campaign_id, wallet_address, budget))
    }

    async fn add_inventory(&self, items: &[PrizeInventoryItem]) -> Result<(), SpinError> {
        delegate!(self, s => s.add_inventory(items))
    }

    async fn reserve_inventory(
        &self,
        campaign_id: CampaignId,
        nft_id: &str,
        wallet_address: &str,
        spin_id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        delegate!(self, s => s.reserve_inventory(campaign_id, nft_id, wallet_address, spin_id, now))
    }

    async fn get_inventory_item(
        &self,
        id: InventoryId,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        delegate!(self, s => s.get_inventory_item(id))
    }

    async fn list_stale_reservations(
        &self,
        campaign_id: CampaignId,
        before: DateTime<Utc>,
    ) -> Result<Vec<PrizeInventoryItem>, SpinError> {
        delegate!(self, s => s.list_stale_reservations(campaign_id, before))
    }

    async fn insert_spin_history(&self, spin: &SpinHistory) -> Result<(), SpinError> {
        delegate!(self, s => s.insert_spin_history(spin))
    }

    async fn get_spin_history(&self, id: SpinHistoryId) -> Result<Option<SpinHistory>, SpinError> {
        delegate!(self, s => s.get_spin_history(id))
    }

    async fn list_spin_history(
        &self,
        campaign_id: CampaignId,
        wallet_address: Option<&str>,
        status: Option<SpinStatus>,
    ) -> Result<Vec<SpinHistory>, SpinError> {
        delegate!(self, s => s.list_spin_history(campaign_id, wallet_address, status))
    }

    async fn begin_claim(&self, id: SpinHistoryId, now: DateTime<Utc>) -> Result<bool, SpinError> {
        delegate!(self, s => s.begin_claim(id, now))
    }

    async fn complete_claim(
        &self,
        id: SpinHistoryId,
        inventory_id: InventoryId,
        wallet_address: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        delegate!(self, s => s.complete_claim(id, inventory_id, wallet_address, tx_hash, now))
    }

    async fn fail_claim(
        &self,
        id: SpinHistoryId,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        delegate!(self, s => s.fail_claim(id, error_message, now))
    }

    async fn campaign_stats(&self, campaign_id: CampaignId) -> Result<CampaignStats, SpinError> {
        delegate!(self, s => s.campaign_stats(campaign_id))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_delegates() {
        let backend = StoreBackend::Memory(InMemoryStore::new());
        assert_eq!(backend.name(), "memory");
        let Ok(campaigns) = backend.list_campaigns().await else {
            panic!("list failed");
        };
        assert!(campaigns.is_empty());
        assert!(matches!(
            backend.campaign_stats(CampaignId::new()).await,
            Err(SpinError::CampaignNotFound(_))
        ));
    }
}
