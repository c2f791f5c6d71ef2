//! In-process store guarded by a single async read-write lock.
//!
//! [`InMemoryStore`] keeps every table in one [`MemoryTables`] value behind
//! a [`tokio::sync::RwLock`]. Each atomic primitive runs as one write-lock
//! critical section, so a conditional decrement or reservation can never
//! interleave with another. Reads share the lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::CampaignStore;
use super::models::{CampaignStats, InventoryCounts, SpinConsumption, SpinCounts};
use crate::domain::{
    Campaign, CampaignId, InventoryId, InventoryStatus, PrizeInventoryItem, SpinBudget,
    SpinHistory, SpinHistoryId, SpinStatus, WhitelistEntry,
};
use crate::error::SpinError;

type WalletKey = (CampaignId, String);

#[derive(Debug, Default)]
struct MemoryTables {
    campaigns: HashMap<CampaignId, Campaign>,
    whitelist: HashMap<WalletKey, WhitelistEntry>,
    spin_counters: HashMap<WalletKey, u32>,
    inventory: Vec<PrizeInventoryItem>,
    history: HashMap<SpinHistoryId, SpinHistory>,
}

impl MemoryTables {
    fn bump_spins_used(&mut self, campaign_id: CampaignId) {
        if let Some(campaign) = self.campaigns.get_mut(&campaign_id) {
            campaign.total_spins_used = campaign.total_spins_used.saturating_add(1);
        }
    }
}

fn wallet_key(campaign_id: CampaignId, wallet_address: &str) -> WalletKey {
    (campaign_id, wallet_address.to_string())
}

/// Store keeping all state in process memory.
///
/// Suitable for development, tests and single-instance deployments where
/// losing state on restart is acceptable.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<MemoryTables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CampaignStore for InMemoryStore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        let mut tables = self.tables.write().await;
        if tables.campaigns.contains_key(&campaign.id) {
            return Err(SpinError::InvalidRequest(format!(
                "campaign {} already exists",
                campaign.id
            )));
        }
        tables.campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .campaigns
            .get_mut(&campaign.id)
            .ok_or(SpinError::CampaignNotFound(campaign.id))?;
        let total_spins_used = stored.total_spins_used;
        let total_prizes_claimed = stored.total_prizes_claimed;
        *stored = campaign.clone();
        stored.total_spins_used = total_spins_used;
        stored.total_prizes_claimed = total_prizes_claimed;
        Ok(())
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, SpinError> {
        Ok(self.tables.read().await.campaigns.get(&id).cloned())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, SpinError> {
        let tables = self.tables.read().await;
        let mut campaigns: Vec<Campaign> = tables.campaigns.values().cloned().collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    async fn upsert_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        spins_allowed: u32,
        now: DateTime<Utc>,
    ) -> Result<WhitelistEntry, SpinError> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .whitelist
            .entry(wallet_key(campaign_id, wallet_address))
            .or_insert_with(|| {
                WhitelistEntry::new(campaign_id, wallet_address.to_string(), spins_allowed, now)
            });
        if spins_allowed < entry.spins_used {
            return Err(SpinError::InvalidRequest(format!(
                "wallet already used {} spins, cannot lower allowance to {spins_allowed}",
                entry.spins_used
            )));
        }
        entry.spins_allowed = spins_allowed;
        entry.updated_at = now;
        Ok(entry.clone())
    }

    async fn remove_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<bool, SpinError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .whitelist
            .remove(&wallet_key(campaign_id, wallet_address))
            .is_some())
    }

    async fn get_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<Option<WhitelistEntry>, SpinError> {
        let tables = self.tables.read().await;
        Ok(tables
            .whitelist
            .get(&wallet_key(campaign_id, wallet_address))
            .cloned())
    }

    async fn wallet_spins_used(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<u32, SpinError> {
        let tables = self.tables.read().await;
        Ok(tables
            .spin_counters
            .get(&wallet_key(campaign_id, wallet_address))
            .copied()
            .unwrap_or(0))
    }

    async fn consume_spin(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        budget: SpinBudget,
    ) -> Result<SpinConsumption, SpinError> {
        let mut tables = self.tables.write().await;
        let key = wallet_key(campaign_id, wallet_address);

        let remaining = match budget {
            SpinBudget::Whitelist => {
                let Some(entry) = tables.whitelist.get_mut(&key) else {
                    return Ok(SpinConsumption::denied());
                };
                if entry.spins_used >= entry.spins_allowed {
                    return Ok(SpinConsumption::denied());
                }
                entry.spins_used += 1;
                entry.updated_at = Utc::now();
                entry.remaining()
            }
            SpinBudget::PerWallet(limit) => {
                let used = tables.spin_counters.entry(key).or_insert(0);
                if *used >= limit {
                    return Ok(SpinConsumption::denied());
                }
                *used += 1;
                limit - *used
            }
        };

        tables.bump_spins_used(campaign_id);
        Ok(SpinConsumption::granted(remaining))
    }

    async fn add_inventory(&self, items: &[PrizeInventoryItem]) -> Result<(), SpinError> {
        let mut tables = self.tables.write().await;
        if let Some(dup) = items
            .iter()
            .find(|item| tables.inventory.iter().any(|existing| existing.id == item.id))
        {
            return Err(SpinError::InvalidRequest(format!(
                "inventory unit {} already exists",
                dup.id
            )));
        }
        tables.inventory.extend_from_slice(items);
        Ok(())
    }

    async fn reserve_inventory(
        &self,
        campaign_id: CampaignId,
        nft_id: &str,
        wallet_address: &str,
        spin_id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.inventory.iter_mut().find(|item| {
            item.campaign_id == campaign_id
                && item.nft_id == nft_id
                && item.status == InventoryStatus::Available
        }) else {
            return Ok(None);
        };
        item.status = InventoryStatus::Reserved;
        item.reserved_for_spin_history_id = Some(spin_id);
        item.reserved_by = Some(wallet_address.to_string());
        item.reserved_at = Some(now);
        Ok(Some(item.clone()))
    }

    async fn get_inventory_item(
        &self,
        id: InventoryId,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        let tables = self.tables.read().await;
        Ok(tables.inventory.iter().find(|item| item.id == id).cloned())
    }

    async fn list_stale_reservations(
        &self,
        campaign_id: CampaignId,
        before: DateTime<Utc>,
    ) -> Result<Vec<PrizeInventoryItem>, SpinError> {
        let tables = self.tables.read().await;
        Ok(tables
            .inventory
            .iter()
            .filter(|item| {
                item.campaign_id == campaign_id
                    && item.status == InventoryStatus::Reserved
                    && item.reserved_at.is_some_and(|at| at < before)
            })
            .cloned()
            .collect())
    }

    async fn insert_spin_history(&self, spin: &SpinHistory) -> Result<(), SpinError> {
        let mut tables = self.tables.write().await;
        if tables.history.contains_key(&spin.id) {
            return Err(SpinError::Persistence(format!(
                "spin {} already recorded",
                spin.id
            )));
        }
        tables.history.insert(spin.id, spin.clone());
        Ok(())
    }

    async fn get_spin_history(&self, id: SpinHistoryId) -> Result<Option<SpinHistory>, SpinError> {
        Ok(self.tables.read().await.history.get(&id).cloned())
    }

    async fn list_spin_history(
        &self,
        campaign_id: CampaignId,
        wallet_address: Option<&str>,
        status: Option<SpinStatus>,
    ) -> Result<Vec<SpinHistory>, SpinError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SpinHistory> = tables
            .history
            .values()
            .filter(|spin| spin.campaign_id == campaign_id)
            .filter(|spin| wallet_address.is_none_or(|w| spin.wallet_address == w))
            .filter(|spin| status.is_none_or(|s| spin.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn begin_claim(&self, id: SpinHistoryId, now: DateTime<Utc>) -> Result<bool, SpinError> {
        let mut tables = self.tables.write().await;
        let Some(spin) = tables.history.get_mut(&id) else {
            return Ok(false);
        };
        if !spin.status.is_claimable() {
            return Ok(false);
        }
        spin.status = SpinStatus::Claiming;
        spin.updated_at = now;
        Ok(true)
    }

    async fn complete_claim(
        &self,
        id: SpinHistoryId,
        inventory_id: InventoryId,
        wallet_address: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        let mut tables = self.tables.write().await;

        let campaign_id = match tables.history.get(&id) {
            Some(spin) if spin.status == SpinStatus::Claiming => spin.campaign_id,
            Some(spin) => {
                return Err(SpinError::Persistence(format!(
                    "spin {id} is {} rather than claiming",
                    spin.status
                )));
            }
            None => return Err(SpinError::Persistence(format!("spin {id} not found"))),
        };

        let item = tables
            .inventory
            .iter_mut()
            .find(|item| {
                item.id == inventory_id
                    && item.status == InventoryStatus::Reserved
                    && item.reserved_for_spin_history_id == Some(id)
            })
            .ok_or_else(|| {
                SpinError::Persistence(format!(
                    "inventory unit {inventory_id} is not reserved for spin {id}"
                ))
            })?;
        item.status = InventoryStatus::Claimed;
        item.claimed_by = Some(wallet_address.to_string());
        item.claimed_at = Some(now);

        if let Some(spin) = tables.history.get_mut(&id) {
            spin.status = SpinStatus::Completed;
            spin.tx_hash = Some(tx_hash.to_string());
            spin.error_message = None;
            spin.updated_at = now;
        }
        if let Some(campaign) = tables.campaigns.get_mut(&campaign_id) {
            campaign.total_prizes_claimed = campaign.total_prizes_claimed.saturating_add(1);
        }
        Ok(())
    }

    async fn fail_claim(
        &self,
        id: SpinHistoryId,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        let mut tables = self.tables.write().await;
        match tables.history.get_mut(&id) {
            Some(spin) if spin.status == SpinStatus::Claiming => {
                spin.status = SpinStatus::Failed;
                spin.error_message = Some(error_message.to_string());
                spin.updated_at = now;
                Ok(())
            }
            Some(spin) => Err(SpinError::Persistence(format!(
                "spin {id} is {} rather than claiming",
                spin.status
            ))),
            None => Err(SpinError::Persistence(format!("spin {id} not found"))),
        }
    }

    async fn campaign_stats(&self, campaign_id: CampaignId) -> Result<CampaignStats, SpinError> {
        let tables = self.tables.read().await;
        let campaign = tables
            .campaigns
            .get(&campaign_id)
            .ok_or(SpinError::CampaignNotFound(campaign_id))?;

        let mut spins = SpinCounts::default();
        for spin in tables
            .history
            .values()
            .filter(|s| s.campaign_id == campaign_id)
        {
            spins.record(spin.status, 1);
        }

        let mut inventory = InventoryCounts::default();
        for item in tables
            .inventory
            .iter()
            .filter(|i| i.campaign_id == campaign_id)
        {
            inventory.record(item.status, 1);
        }

        let whitelist_entries = tables
            .whitelist
            .keys()
            .filter(|(id, _)| *id == campaign_id)
            .count() as u64;

        Ok(CampaignStats {
            campaign_id,
            total_spins_used: campaign.total_spins_used,
            total_prizes_claimed: campaign.total_prizes_claimed,
            whitelist_entries,
            spins,
            inventory,
        })
    }
}
