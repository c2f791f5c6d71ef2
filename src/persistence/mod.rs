//! Persistence layer: the transactional store behind the engine.
//!
//! [`CampaignStore`] exposes the atomic primitives the engine relies on
//! ([`CampaignStore::consume_spin`], [`CampaignStore::reserve_inventory`],
//! [`CampaignStore::begin_claim`], [`CampaignStore::complete_claim`]) plus
//! ordinary CRUD. Two backends implement it: [`memory::InMemoryStore`] and
//! [`postgres::PostgresStore`]; [`StoreBackend`] selects one at startup.

pub mod backend;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};

pub use backend::StoreBackend;
pub use memory::InMemoryStore;
pub use models::{CampaignStats, InventoryCounts, SpinConsumption, SpinCounts};
pub use postgres::PostgresStore;

use crate::domain::{
    Campaign, CampaignId, InventoryId, PrizeInventoryItem, SpinBudget, SpinHistory,
    SpinHistoryId, SpinStatus, WhitelistEntry,
};
use crate::error::SpinError;

/// Transactional store for campaigns, ledgers, inventory and history.
///
/// # Atomicity
///
/// - `consume_spin` succeeds for exactly `min(N, K)` of `N` concurrent
///   calls against a remaining budget `K`.
/// - `reserve_inventory` hands a given unit to exactly one caller.
/// - `begin_claim` lets exactly one caller take a claimable spin.
/// - `complete_claim` marks the unit `claimed`, the spin `completed` and
///   bumps the campaign counter as one unit of work.
///
/// Losers of a race get a definitive negative answer; nothing retries.
pub trait CampaignStore: Send + Sync + fmt::Debug + 'static {
    /// Persists a new campaign.
    fn insert_campaign(
        &self,
        campaign: &Campaign,
    ) -> impl Future<Output = Result<(), SpinError>> + Send;

    /// Overwrites the operator settings of a campaign. Counters are kept.
    fn update_campaign(
        &self,
        campaign: &Campaign,
    ) -> impl Future<Output = Result<(), SpinError>> + Send;

    /// Loads one campaign.
    fn get_campaign(
        &self,
        id: CampaignId,
    ) -> impl Future<Output = Result<Option<Campaign>, SpinError>> + Send;

    /// Loads all campaigns, newest first.
    fn list_campaigns(&self) -> impl Future<Output = Result<Vec<Campaign>, SpinError>> + Send;

    /// Creates or updates a whitelist entry, keeping `spins_used`.
    fn upsert_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        spins_allowed: u32,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<WhitelistEntry, SpinError>> + Send;

    /// Deletes a whitelist entry. Returns `false` if none existed.
    fn remove_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> impl Future<Output = Result<bool, SpinError>> + Send;

    /// Loads a whitelist entry.
    fn get_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> impl Future<Output = Result<Option<WhitelistEntry>, SpinError>> + Send;

    /// Spins consumed by a wallet in a campaign without a whitelist.
    fn wallet_spins_used(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> impl Future<Output = Result<u32, SpinError>> + Send;

    /// Atomically consumes one spin and bumps the campaign counter.
    fn consume_spin(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        budget: SpinBudget,
    ) -> impl Future<Output = Result<SpinConsumption, SpinError>> + Send;

    /// Adds inventory units.
    fn add_inventory(
        &self,
        items: &[PrizeInventoryItem],
    ) -> impl Future<Output = Result<(), SpinError>> + Send;

    /// Atomically reserves one available unit of `nft_id` for a spin.
    /// Returns `None` without side effects when none is available.
    fn reserve_inventory(
        &self,
        campaign_id: CampaignId,
        nft_id: &str,
        wallet_address: &str,
        spin_id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<PrizeInventoryItem>, SpinError>> + Send;

    /// Loads one inventory unit.
    fn get_inventory_item(
        &self,
        id: InventoryId,
    ) -> impl Future<Output = Result<Option<PrizeInventoryItem>, SpinError>> + Send;

    /// Reserved units whose reservation is older than `before`.
    fn list_stale_reservations(
        &self,
        campaign_id: CampaignId,
        before: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<PrizeInventoryItem>, SpinError>> + Send;

    /// Persists a spin history row.
    fn insert_spin_history(
        &self,
        spin: &SpinHistory,
    ) -> impl Future<Output = Result<(), SpinError>> + Send;

    /// Loads one spin history row.
    fn get_spin_history(
        &self,
        id: SpinHistoryId,
    ) -> impl Future<Output = Result<Option<SpinHistory>, SpinError>> + Send;

    /// Lists spin history of a campaign, newest first, optionally filtered.
    fn list_spin_history(
        &self,
        campaign_id: CampaignId,
        wallet_address: Option<&str>,
        status: Option<SpinStatus>,
    ) -> impl Future<Output = Result<Vec<SpinHistory>, SpinError>> + Send;

    /// Atomically moves a `reserved` or `failed` spin to `claiming`.
    /// Returns `false` if the spin is not claimable.
    fn begin_claim(
        &self,
        id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, SpinError>> + Send;

    /// Finalizes a claim: unit `claimed`, spin `completed` with `tx_hash`,
    /// campaign `total_prizes_claimed` incremented.
    fn complete_claim(
        &self,
        id: SpinHistoryId,
        inventory_id: InventoryId,
        wallet_address: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), SpinError>> + Send;

    /// Marks a `claiming` spin `failed`, keeping the unit reserved.
    fn fail_claim(
        &self,
        id: SpinHistoryId,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), SpinError>> + Send;

    /// Aggregates counters for one campaign.
    fn campaign_stats(
        &self,
        campaign_id: CampaignId,
    ) -> impl Future<Output = Result<CampaignStats, SpinError>> + Send;
}
