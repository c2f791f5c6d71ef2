//! Operator-only DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{NewInventoryUnit, PrizeInventoryItem, SpinHistory};

/// Request body for `POST /admin/campaigns/:id/active`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    /// Whether the campaign accepts spins.
    pub active: bool,
}

/// Request body for `PUT /admin/campaigns/:id/whitelist`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WhitelistRequest {
    /// Wallet to allow.
    pub wallet_address: String,
    /// Spin allowance. Cannot drop below spins already used.
    pub spins_allowed: u32,
}

/// Response body for `DELETE /admin/campaigns/:id/whitelist/:wallet`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WhitelistRemovalResponse {
    /// `false` if the wallet was not whitelisted.
    pub removed: bool,
}

/// Request body for `POST /admin/campaigns/:id/inventory`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryRequest {
    /// Units to add. Each `nft_id` must match an NFT prize of the campaign.
    pub units: Vec<NewInventoryUnit>,
}

/// Inventory listing used by the inventory and stale reservation endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryResponse {
    /// Inventory units.
    pub data: Vec<PrizeInventoryItem>,
}

/// Response body for `GET /admin/campaigns/:id/failed-spins`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FailedSpinsResponse {
    /// Spins that are `failed` or stuck in `claiming`, newest first.
    pub data: Vec<SpinHistory>,
}

/// Query for `GET /admin/campaigns/:id/stale-reservations`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StaleQuery {
    /// Minimum reservation age in seconds. Defaults to one day.
    #[serde(default = "default_older_than_secs")]
    pub older_than_secs: u64,
}

fn default_older_than_secs() -> u64 {
    86_400
}

impl StaleQuery {
    /// Reservation age threshold as a [`chrono::Duration`].
    #[must_use]
    pub fn older_than(&self) -> chrono::Duration {
        i64::try_from(self.older_than_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
