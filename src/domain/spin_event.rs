//! Domain events reflecting campaign state changes.
//!
//! Every spin, reservation and claim emits a [`SpinEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CampaignId, InventoryId, PrizeType, SpinHistoryId, SpinStatus};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SpinEvent {
    /// Emitted when a campaign is created or its settings change.
    CampaignUpdated {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Whether the campaign accepts spins.
        active: bool,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a spin outcome is recorded.
    SpinExecuted {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Recorded spin.
        spin_id: SpinHistoryId,
        /// Winning wallet.
        wallet_address: String,
        /// Awarded prize type.
        prize_type: PrizeType,
        /// Label of the awarded prize.
        label: String,
        /// Status the spin was recorded with.
        status: SpinStatus,
        /// Spin timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a scarce unit is reserved for a spin.
    PrizeReserved {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Reserving spin.
        spin_id: SpinHistoryId,
        /// Reserved unit.
        inventory_id: InventoryId,
        /// Inventory pool key.
        nft_id: String,
        /// Reservation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful transfer.
    PrizeClaimed {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Claimed spin.
        spin_id: SpinHistoryId,
        /// Recipient wallet.
        wallet_address: String,
        /// Transfer transaction hash.
        tx_hash: String,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the transfer capability fails during a claim.
    ClaimFailed {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Spin whose claim failed.
        spin_id: SpinHistoryId,
        /// Transfer error message.
        error: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl SpinEvent {
    /// Returns the campaign ID associated with this event.
    #[must_use]
    pub fn campaign_id(&self) -> CampaignId {
        match self {
            Self::CampaignUpdated { campaign_id, .. }
            | Self::SpinExecuted { campaign_id, .. }
            | Self::PrizeReserved { campaign_id, .. }
            | Self::PrizeClaimed { campaign_id, .. }
            | Self::ClaimFailed { campaign_id, .. } => *campaign_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::CampaignUpdated { .. } => "campaign_updated",
            Self::SpinExecuted { .. } => "spin_executed",
            Self::PrizeReserved { .. } => "prize_reserved",
            Self::PrizeClaimed { .. } => "prize_claimed",
            Self::ClaimFailed { .. } => "claim_failed",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn spin_executed_serializes_with_tag() {
        let event = SpinEvent::SpinExecuted {
            campaign_id: CampaignId::new(),
            spin_id: SpinHistoryId::new(),
            wallet_address: "0xabc".to_string(),
            prize_type: PrizeType::Message,
            label: "Try again".to_string(),
            status: SpinStatus::Completed,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"spin_executed\""));
        assert!(json.contains("\"prize_type\":\"message\""));
        assert_eq!(event.event_type_str(), "spin_executed");
    }

    #[test]
    fn campaign_id_accessor() {
        let id = CampaignId::new();
        let event = SpinEvent::CampaignUpdated {
            campaign_id: id,
            active: false,
            timestamp: Utc::now(),
        };
        assert_eq!(event.campaign_id(), id);
    }
}
