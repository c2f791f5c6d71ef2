//! Per-wallet spin allowances for whitelist-only campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CampaignId;

/// Spin allowance of one wallet in one campaign.
///
/// Unique per `(campaign_id, wallet_address)`. Invariant:
/// `spins_used <= spins_allowed`. Only the spin ledger increments
/// `spins_used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WhitelistEntry {
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Opaque wallet principal.
    pub wallet_address: String,
    /// Total spins granted.
    pub spins_allowed: u32,
    /// Spins already consumed.
    pub spins_used: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last allowance change or spin.
    pub updated_at: DateTime<Utc>,
}

impl WhitelistEntry {
    /// Creates an entry with no spins used.
    #[must_use]
    pub fn new(
        campaign_id: CampaignId,
        wallet_address: String,
        spins_allowed: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            campaign_id,
            wallet_address,
            spins_allowed,
            spins_used: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Spins the wallet may still consume.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.spins_allowed.saturating_sub(self.spins_used)
    }
}
