//! Result types shared by every store backend.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CampaignId, InventoryStatus, SpinStatus};

/// Outcome of an atomic spin-ledger decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinConsumption {
    /// Whether one spin was consumed.
    pub allowed: bool,
    /// Spins left after this call.
    pub spins_remaining: u32,
}

impl SpinConsumption {
    /// A refused decrement: no budget or lost race.
    #[must_use]
    pub const fn denied() -> Self {
        Self {
            allowed: false,
            spins_remaining: 0,
        }
    }

    /// A granted decrement with the budget left afterwards.
    #[must_use]
    pub const fn granted(spins_remaining: u32) -> Self {
        Self {
            allowed: true,
            spins_remaining,
        }
    }
}

/// Spin history row counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SpinCounts {
    /// NFT reserved, awaiting claim.
    pub reserved: u64,
    /// Claim in flight.
    pub claiming: u64,
    /// Final outcomes.
    pub completed: u64,
    /// Failed claims and compensation rows.
    pub failed: u64,
}

impl SpinCounts {
    /// Adds `n` rows with the given status.
    pub fn record(&mut self, status: SpinStatus, n: u64) {
        let slot = match status {
            SpinStatus::Reserved => &mut self.reserved,
            SpinStatus::Claiming => &mut self.claiming,
            SpinStatus::Completed => &mut self.completed,
            SpinStatus::Failed => &mut self.failed,
        };
        *slot = slot.saturating_add(n);
    }

    /// Total number of recorded spins.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.reserved
            .saturating_add(self.claiming)
            .saturating_add(self.completed)
            .saturating_add(self.failed)
    }
}

/// Inventory unit counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct InventoryCounts {
    /// Free units.
    pub available: u64,
    /// Units bound to a spin.
    pub reserved: u64,
    /// Transferred units.
    pub claimed: u64,
}

impl InventoryCounts {
    /// Adds `n` units with the given status.
    pub fn record(&mut self, status: InventoryStatus, n: u64) {
        let slot = match status {
            InventoryStatus::Available => &mut self.available,
            InventoryStatus::Reserved => &mut self.reserved,
            InventoryStatus::Claimed => &mut self.claimed,
        };
        *slot = slot.saturating_add(n);
    }
}

/// Aggregate statistics for one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CampaignStats {
    /// Campaign identifier.
    pub campaign_id: CampaignId,
    /// Spins consumed by the ledger.
    pub total_spins_used: u64,
    /// NFT prizes transferred.
    pub total_prizes_claimed: u64,
    /// Number of whitelisted wallets.
    pub whitelist_entries: u64,
    /// History rows by status.
    pub spins: SpinCounts,
    /// Inventory units by status.
    pub inventory: InventoryCounts,
}
