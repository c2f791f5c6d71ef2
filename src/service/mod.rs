//! Service layer: business logic orchestration.
//!
//! [`SpinService`] runs spins, [`ClaimService`] delivers reserved prizes
//! and [`CampaignService`] serves the catalogue and operator tooling. All
//! three are generic over the [`crate::persistence::CampaignStore`] and
//! emit events through the [`super::domain::EventBus`].

pub mod campaign_service;
pub mod claim_service;
pub mod spin_service;

#[cfg(test)]
pub(crate) mod testkit;

pub use campaign_service::CampaignService;
pub use claim_service::{ClaimResult, ClaimService};
pub use spin_service::{Eligibility, SpinResult, SpinService};

use crate::error::SpinError;

/// Trims a wallet address and rejects empty ones. Addresses are otherwise
/// opaque.
pub(crate) fn require_wallet(wallet_address: &str) -> Result<&str, SpinError> {
    let wallet = wallet_address.trim();
    if wallet.is_empty() {
        return Err(SpinError::InvalidRequest(
            "wallet address is empty".to_string(),
        ));
    }
    Ok(wallet)
}
