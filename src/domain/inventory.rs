//! Scarce prize inventory units.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CampaignId, InventoryId, SpinHistoryId};

/// Lifecycle of an inventory unit. Transitions are monotonic:
/// `available → reserved → claimed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    /// Free to be reserved by a winning spin.
    Available,
    /// Bound to exactly one spin, pending claim.
    Reserved,
    /// Transferred to the winner.
    Claimed,
}

impl InventoryStatus {
    /// Returns the storage name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Claimed => "claimed",
        }
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "claimed" => Ok(Self::Claimed),
            other => Err(format!("unknown inventory status: {other}")),
        }
    }
}

/// Operator input describing one unit to add to the inventory.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewInventoryUnit {
    /// Inventory pool key, matching an NFT prize's `nft_id`.
    pub nft_id: String,
    /// On-chain token handed to the transfer capability, if distinct.
    #[serde(default)]
    pub token_id: Option<String>,
}

/// One concrete scarce unit backing an NFT prize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrizeInventoryItem {
    /// Unit identifier.
    pub id: InventoryId,
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Inventory pool key.
    pub nft_id: String,
    /// On-chain token identifier, if distinct from `nft_id`.
    pub token_id: Option<String>,
    /// Lifecycle status.
    pub status: InventoryStatus,
    /// Spin holding the reservation. Set once, never cleared.
    pub reserved_for_spin_history_id: Option<SpinHistoryId>,
    /// Wallet that won the unit.
    pub reserved_by: Option<String>,
    /// Reservation timestamp.
    pub reserved_at: Option<DateTime<Utc>>,
    /// Wallet the unit was transferred to.
    pub claimed_by: Option<String>,
    /// Transfer completion timestamp.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PrizeInventoryItem {
    /// Creates an available unit.
    #[must_use]
    pub fn available(campaign_id: CampaignId, unit: NewInventoryUnit, now: DateTime<Utc>) -> Self {
        Self {
            id: InventoryId::new(),
            campaign_id,
            nft_id: unit.nft_id,
            token_id: unit.token_id,
            status: InventoryStatus::Available,
            reserved_for_spin_history_id: None,
            reserved_by: None,
            reserved_at: None,
            claimed_by: None,
            claimed_at: None,
            created_at: now,
        }
    }

    /// The identifier handed to the transfer capability.
    #[must_use]
    pub fn transfer_token(&self) -> &str {
        self.token_id.as_deref().unwrap_or(&self.nft_id)
    }
}
