//! Spin history records and the prize outcome snapshot they carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::campaign::PrizeType;
use super::{CampaignId, InventoryId, SpinHistoryId};

/// Status of a spin history row.
///
/// Spins are written as `reserved` (NFT bound, awaiting claim) or
/// `completed` (message outcome). Only the claim manager moves rows on:
/// `reserved → claiming → completed | failed`, and `failed → claiming`
/// on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpinStatus {
    /// NFT reserved, not yet claimed.
    Reserved,
    /// A claim holds the row and the transfer is in flight.
    Claiming,
    /// Final: message awarded or NFT transferred.
    Completed,
    /// Transfer failed, or the spin could not be recorded.
    Failed,
}

impl SpinStatus {
    /// Returns the storage name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Claiming => "claiming",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` if a claim may take the row.
    #[must_use]
    pub const fn is_claimable(&self) -> bool {
        matches!(self, Self::Reserved | Self::Failed)
    }
}

impl fmt::Display for SpinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpinStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(Self::Reserved),
            "claiming" => Ok(Self::Claiming),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown spin status: {other}")),
        }
    }
}

/// Immutable snapshot of what a spin awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrizeOutcome {
    /// Text outcome. Also used when an NFT prize was drawn but its
    /// inventory was exhausted.
    Message {
        /// Label of the winning segment.
        label: String,
        /// Text shown to the wallet.
        message: String,
        /// Inventory key of the exhausted NFT prize, for fallbacks.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_for: Option<String>,
    },
    /// NFT outcome bound to one reserved inventory unit.
    Nft {
        /// Label of the winning segment.
        label: String,
        /// Inventory pool key.
        nft_id: String,
        /// The reserved unit.
        inventory_id: InventoryId,
        /// On-chain token identifier, if distinct.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_id: Option<String>,
    },
}

impl PrizeOutcome {
    /// Returns the prize type discriminator.
    #[must_use]
    pub const fn prize_type(&self) -> PrizeType {
        match self {
            Self::Message { .. } => PrizeType::Message,
            Self::Nft { .. } => PrizeType::Nft,
        }
    }

    /// Returns the label of the winning segment.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Message { label, .. } | Self::Nft { label, .. } => label,
        }
    }

    /// Canonical string bound into the result hash.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Message {
                label,
                message,
                fallback_for,
            } => format!(
                "message|{label}|{message}|{}",
                fallback_for.as_deref().unwrap_or_default()
            ),
            Self::Nft {
                label,
                nft_id,
                inventory_id,
                ..
            } => format!("nft|{label}|{nft_id}|{inventory_id}"),
        }
    }
}

/// One consumed spin.
///
/// Written exactly once per consumed spin by the spin orchestrator,
/// including compensation rows for spins whose outcome could not be
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpinHistory {
    /// Row identifier.
    pub id: SpinHistoryId,
    /// Campaign the spin was taken in.
    pub campaign_id: CampaignId,
    /// Wallet that spun.
    pub wallet_address: String,
    /// What was awarded. `None` only for compensation rows written before
    /// a prize was drawn.
    pub outcome: Option<PrizeOutcome>,
    /// Row status.
    pub status: SpinStatus,
    /// Transfer transaction hash once claimed.
    pub tx_hash: Option<String>,
    /// Last transfer or recording error.
    pub error_message: Option<String>,
    /// Tamper-evidence token over the outcome.
    pub result_hash: String,
    /// Wheel position shown to the client.
    pub visual_segment_index: Option<u32>,
    /// Spin timestamp, truncated to microseconds.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl SpinHistory {
    /// Prize type of the outcome, if known.
    #[must_use]
    pub fn prize_type(&self) -> Option<PrizeType> {
        self.outcome.as_ref().map(PrizeOutcome::prize_type)
    }

    /// The reserved inventory unit, for NFT outcomes.
    #[must_use]
    pub fn inventory_id(&self) -> Option<InventoryId> {
        match &self.outcome {
            Some(PrizeOutcome::Nft { inventory_id, .. }) => Some(*inventory_id),
            _ => None,
        }
    }

    /// Builds a `failed` row recording a consumed spin whose outcome could
    /// not be persisted. The row is unsigned; callers holding a
    /// [`ResultSigner`](super::ResultSigner) set `result_hash` before
    /// storing it so an NFT outcome stays claimable.
    #[must_use]
    pub fn compensation(
        id: SpinHistoryId,
        campaign_id: CampaignId,
        wallet_address: String,
        outcome: Option<PrizeOutcome>,
        error_message: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            campaign_id,
            wallet_address,
            outcome,
            status: SpinStatus::Failed,
            tx_hash: None,
            error_message: Some(error_message),
            result_hash: String::new(),
            visual_segment_index: None,
            created_at,
            updated_at: created_at,
        }
    }
}
