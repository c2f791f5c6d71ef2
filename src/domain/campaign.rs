//! Campaign configuration and its weighted prize list.
//!
//! A [`Campaign`] is created and mutated only through campaign
//! administration. Its prize list is validated at write time so that a
//! misconfigured campaign is rejected before persistence rather than
//! discovered when a wallet spins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CampaignId;
use crate::error::SpinError;

/// Allowed deviation of the summed prize probabilities from `1.0`.
pub const PROBABILITY_EPSILON: f64 = 0.001;

/// Discriminator shared by prize definitions and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrizeType {
    /// A scarce NFT backed by prize inventory.
    Nft,
    /// A non-scarce text outcome.
    Message,
}

impl PrizeType {
    /// Returns the wire name of the prize type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nft => "nft",
            Self::Message => "message",
        }
    }
}

/// One weighted position on the campaign wheel.
///
/// Several definitions may describe the same logical prize to give it
/// multiple wheel positions; see [`PrizeDefinition::same_prize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrizeDefinition {
    /// Non-scarce outcome that is shown to the wallet.
    Message {
        /// Wheel label.
        label: String,
        /// Draw weight in `[0, 1]`.
        probability: f64,
        /// Optional text shown when this segment wins. Defaults to the label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Scarce NFT prize drawn from the campaign inventory.
    Nft {
        /// Wheel label.
        label: String,
        /// Draw weight in `[0, 1]`.
        probability: f64,
        /// Inventory pool key this prize reserves from.
        nft_id: String,
        /// Text awarded instead when the inventory is exhausted.
        fallback_message: String,
    },
}

impl PrizeDefinition {
    /// Returns the wheel label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Message { label, .. } | Self::Nft { label, .. } => label,
        }
    }

    /// Returns the draw weight.
    #[must_use]
    pub const fn probability(&self) -> f64 {
        match self {
            Self::Message { probability, .. } | Self::Nft { probability, .. } => *probability,
        }
    }

    /// Returns the prize type discriminator.
    #[must_use]
    pub const fn prize_type(&self) -> PrizeType {
        match self {
            Self::Message { .. } => PrizeType::Message,
            Self::Nft { .. } => PrizeType::Nft,
        }
    }

    /// Returns the inventory key for NFT prizes.
    #[must_use]
    pub fn nft_id(&self) -> Option<&str> {
        match self {
            Self::Nft { nft_id, .. } => Some(nft_id),
            Self::Message { .. } => None,
        }
    }

    /// Returns `true` if both definitions describe the same logical prize,
    /// ignoring their weights.
    #[must_use]
    pub fn same_prize(&self, other: &Self) -> bool {
        self.prize_type() == other.prize_type()
            && self.label() == other.label()
            && self.nft_id() == other.nft_id()
    }
}

/// Validates a prize list.
///
/// # Errors
///
/// Returns [`SpinError::Configuration`] if the list is empty, a weight is
/// outside `[0, 1]`, an NFT prize has no inventory key, or the weights do
/// not sum to `1.0` within [`PROBABILITY_EPSILON`].
pub fn validate_prizes(prizes: &[PrizeDefinition]) -> Result<(), SpinError> {
    if prizes.is_empty() {
        return Err(SpinError::Configuration("campaign has no prizes".to_string()));
    }

    let mut total = 0.0;
    for prize in prizes {
        let p = prize.probability();
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(SpinError::Configuration(format!(
                "prize '{}' has probability {p} outside [0, 1]",
                prize.label()
            )));
        }
        if let Some(nft_id) = prize.nft_id()
            && nft_id.trim().is_empty()
        {
            return Err(SpinError::Configuration(format!(
                "nft prize '{}' has no nft_id",
                prize.label()
            )));
        }
        total += p;
    }

    if (total - 1.0).abs() > PROBABILITY_EPSILON {
        return Err(SpinError::Configuration(format!(
            "prize probabilities sum to {total:.4}, expected 1.0"
        )));
    }
    Ok(())
}

/// How a campaign limits spins per wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinBudget {
    /// Budget comes from the wallet's whitelist entry.
    Whitelist,
    /// Every wallet gets the same number of spins.
    PerWallet(u32),
}

/// Operator-supplied campaign settings, used for create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CampaignDraft {
    /// Display name.
    pub name: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Whether the campaign accepts spins.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Inclusive start of the spin window.
    pub start_date: DateTime<Utc>,
    /// Exclusive end of the spin window, if any.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Spins per wallet when no whitelist is required.
    #[serde(default = "default_spins_per_wallet")]
    pub spins_per_wallet: u32,
    /// Whether only whitelisted wallets may spin.
    #[serde(default)]
    pub require_whitelist: bool,
    /// Ordered wheel segments.
    pub prizes: Vec<PrizeDefinition>,
}

const fn default_active() -> bool {
    true
}

const fn default_spins_per_wallet() -> u32 {
    1
}

impl CampaignDraft {
    /// Validates the draft before it is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::InvalidRequest`] for an empty name or an
    /// inverted window and [`SpinError::Configuration`] for an invalid
    /// prize list.
    pub fn validate(&self) -> Result<(), SpinError> {
        if self.name.trim().is_empty() {
            return Err(SpinError::InvalidRequest("campaign name is empty".to_string()));
        }
        if let Some(end) = self.end_date
            && end <= self.start_date
        {
            return Err(SpinError::InvalidRequest(
                "end_date must be after start_date".to_string(),
            ));
        }
        validate_prizes(&self.prizes)
    }
}

/// A time-boxed promotional configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Campaign {
    /// Campaign identifier.
    pub id: CampaignId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Whether the campaign accepts spins.
    pub active: bool,
    /// Inclusive start of the spin window.
    pub start_date: DateTime<Utc>,
    /// Exclusive end of the spin window, if any.
    pub end_date: Option<DateTime<Utc>>,
    /// Spins per wallet when no whitelist is required.
    pub spins_per_wallet: u32,
    /// Whether only whitelisted wallets may spin.
    pub require_whitelist: bool,
    /// Ordered wheel segments.
    pub prizes: Vec<PrizeDefinition>,
    /// Spins consumed across all wallets.
    pub total_spins_used: u64,
    /// NFT prizes successfully claimed.
    pub total_prizes_claimed: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last metadata update.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Builds a new campaign from a validated draft.
    #[must_use]
    pub fn from_draft(draft: CampaignDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: CampaignId::new(),
            name: draft.name,
            description: draft.description,
            active: draft.active,
            start_date: draft.start_date,
            end_date: draft.end_date,
            spins_per_wallet: draft.spins_per_wallet,
            require_whitelist: draft.require_whitelist,
            prizes: draft.prizes,
            total_spins_used: 0,
            total_prizes_claimed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the operator-controlled settings, keeping counters.
    pub fn apply(&mut self, draft: CampaignDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.description = draft.description;
        self.active = draft.active;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.spins_per_wallet = draft.spins_per_wallet;
        self.require_whitelist = draft.require_whitelist;
        self.prizes = draft.prizes;
        self.updated_at = now;
    }

    /// Checks the active flag and the `[start_date, end_date)` window.
    ///
    /// # Errors
    ///
    /// Returns the human-readable reason the campaign refuses spins.
    pub fn check_window(&self, now: DateTime<Utc>) -> Result<(), &'static str> {
        if !self.active {
            return Err("campaign is not active");
        }
        if now < self.start_date {
            return Err("campaign has not started");
        }
        if let Some(end) = self.end_date
            && now >= end
        {
            return Err("campaign has ended");
        }
        Ok(())
    }

    /// Returns `true` if the campaign accepts spins at `now`.
    #[must_use]
    pub fn accepts_spins(&self, now: DateTime<Utc>) -> bool {
        self.check_window(now).is_ok()
    }

    /// Returns the ledger budget mode for this campaign.
    #[must_use]
    pub const fn budget(&self) -> SpinBudget {
        if self.require_whitelist {
            SpinBudget::Whitelist
        } else {
            SpinBudget::PerWallet(self.spins_per_wallet)
        }
    }

    /// Returns `true` if some NFT prize of this campaign draws from `nft_id`.
    #[must_use]
    pub fn references_nft(&self, nft_id: &str) -> bool {
        self.prizes.iter().any(|p| p.nft_id() == Some(nft_id))
    }
}
