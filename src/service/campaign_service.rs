//! Campaign catalogue and operator administration.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::require_wallet;
use crate::auth::OperatorPolicy;
use crate::domain::{
    Campaign, CampaignDraft, CampaignId, EventBus, NewInventoryUnit, PrizeInventoryItem,
    SpinEvent, SpinHistory, SpinStatus, WhitelistEntry,
};
use crate::error::SpinError;
use crate::persistence::{CampaignStats, CampaignStore};

/// Public campaign reads plus operator-gated mutations.
///
/// Every administrative method takes the caller's wallet and checks it
/// against the [`OperatorPolicy`] before touching the store.
#[derive(Debug)]
pub struct CampaignService<S> {
    store: Arc<S>,
    event_bus: EventBus,
    operators: Arc<dyn OperatorPolicy>,
}

impl<S: CampaignStore> CampaignService<S> {
    /// Creates a new `CampaignService`.
    #[must_use]
    pub fn new(store: Arc<S>, event_bus: EventBus, operators: Arc<dyn OperatorPolicy>) -> Self {
        Self {
            store,
            event_bus,
            operators,
        }
    }

    /// Campaigns accepting spins right now, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Persistence`] on storage failure.
    pub async fn get_active_campaigns(&self) -> Result<Vec<Campaign>, SpinError> {
        let now = Utc::now();
        let mut campaigns = self.store.list_campaigns().await?;
        campaigns.retain(|c| c.accepts_spins(now));
        Ok(campaigns)
    }

    /// Loads one campaign.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::CampaignNotFound`] if it does not exist.
    pub async fn get_campaign_by_id(&self, id: CampaignId) -> Result<Campaign, SpinError> {
        self.store
            .get_campaign(id)
            .await?
            .ok_or(SpinError::CampaignNotFound(id))
    }

    /// Validates and persists a new campaign.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] for non-operators and
    /// [`SpinError::Configuration`] or [`SpinError::InvalidRequest`] for an
    /// invalid draft. Nothing is written on error.
    pub async fn create_campaign(
        &self,
        operator: Option<&str>,
        draft: CampaignDraft,
    ) -> Result<Campaign, SpinError> {
        let operator = self.operators.authorize(operator)?;
        draft.validate()?;

        let campaign = Campaign::from_draft(draft, Utc::now());
        self.store.insert_campaign(&campaign).await?;
        self.announce(&campaign);
        tracing::info!(campaign_id = %campaign.id, operator, name = campaign.name.as_str(), "campaign created");
        Ok(campaign)
    }

    /// Replaces the settings of a campaign, keeping its counters.
    ///
    /// # Errors
    ///
    /// As [`Self::create_campaign`], plus [`SpinError::CampaignNotFound`].
    pub async fn update_campaign(
        &self,
        operator: Option<&str>,
        id: CampaignId,
        draft: CampaignDraft,
    ) -> Result<Campaign, SpinError> {
        let operator = self.operators.authorize(operator)?;
        draft.validate()?;

        let mut campaign = self.get_campaign_by_id(id).await?;
        campaign.apply(draft, Utc::now());
        self.store.update_campaign(&campaign).await?;
        self.announce(&campaign);
        tracing::info!(campaign_id = %id, operator, "campaign updated");
        Ok(campaign)
    }

    /// Opens or closes a campaign for spins.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
    pub async fn set_campaign_active(
        &self,
        operator: Option<&str>,
        id: CampaignId,
        active: bool,
    ) -> Result<Campaign, SpinError> {
        let operator = self.operators.authorize(operator)?;
        let mut campaign = self.get_campaign_by_id(id).await?;
        campaign.active = active;
        campaign.updated_at = Utc::now();
        self.store.update_campaign(&campaign).await?;
        self.announce(&campaign);
        tracing::info!(campaign_id = %id, operator, active, "campaign activation changed");
        Ok(campaign)
    }

    /// Grants `spins_allowed` spins to a wallet, creating the entry if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::InvalidRequest`] if the wallet already used more
    /// spins than the new allowance.
    pub async fn add_to_whitelist(
        &self,
        operator: Option<&str>,
        id: CampaignId,
        wallet_address: &str,
        spins_allowed: u32,
    ) -> Result<WhitelistEntry, SpinError> {
        let operator = self.operators.authorize(operator)?;
        let wallet = require_wallet(wallet_address)?;
        self.get_campaign_by_id(id).await?;

        let entry = self
            .store
            .upsert_whitelist_entry(id, wallet, spins_allowed, Utc::now())
            .await?;
        tracing::info!(campaign_id = %id, operator, wallet, spins_allowed, "wallet whitelisted");
        Ok(entry)
    }

    /// Removes a wallet from the whitelist. Returns `false` if it was not
    /// listed.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
    pub async fn remove_from_whitelist(
        &self,
        operator: Option<&str>,
        id: CampaignId,
        wallet_address: &str,
    ) -> Result<bool, SpinError> {
        let operator = self.operators.authorize(operator)?;
        let wallet = require_wallet(wallet_address)?;
        self.get_campaign_by_id(id).await?;

        let removed = self.store.remove_whitelist_entry(id, wallet).await?;
        if removed {
            tracing::info!(campaign_id = %id, operator, wallet, "wallet removed from whitelist");
        }
        Ok(removed)
    }

    /// Adds scarce units backing the campaign's NFT prizes.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::InvalidRequest`] for an empty batch or an
    /// `nft_id` that no NFT prize of the campaign draws from.
    pub async fn add_prize_inventory(
        &self,
        operator: Option<&str>,
        id: CampaignId,
        units: Vec<NewInventoryUnit>,
    ) -> Result<Vec<PrizeInventoryItem>, SpinError> {
        let operator = self.operators.authorize(operator)?;
        let campaign = self.get_campaign_by_id(id).await?;
        if units.is_empty() {
            return Err(SpinError::InvalidRequest("no inventory units given".to_string()));
        }
        if let Some(unit) = units.iter().find(|u| !campaign.references_nft(&u.nft_id)) {
            return Err(SpinError::InvalidRequest(format!(
                "no nft prize of campaign {id} draws from '{}'",
                unit.nft_id
            )));
        }

        let now = Utc::now();
        let items: Vec<PrizeInventoryItem> = units
            .into_iter()
            .map(|unit| PrizeInventoryItem::available(id, unit, now))
            .collect();
        self.store.add_inventory(&items).await?;
        tracing::info!(campaign_id = %id, operator, units = items.len(), "inventory added");
        Ok(items)
    }

    /// Aggregated counters for a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
    pub async fn get_campaign_stats(
        &self,
        operator: Option<&str>,
        id: CampaignId,
    ) -> Result<CampaignStats, SpinError> {
        self.operators.authorize(operator)?;
        self.store.campaign_stats(id).await
    }

    /// Spins needing operator attention, newest first: `failed` rows
    /// (transfer failures awaiting retry, consumed spins whose outcome could
    /// not be stored) and rows left in `claiming`, where a transfer may have
    /// gone out without the claim being recorded.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
    pub async fn list_failed_spins(
        &self,
        operator: Option<&str>,
        id: CampaignId,
    ) -> Result<Vec<SpinHistory>, SpinError> {
        self.operators.authorize(operator)?;
        self.get_campaign_by_id(id).await?;
        let mut spins = self
            .store
            .list_spin_history(id, None, Some(SpinStatus::Failed))
            .await?;
        spins.extend(
            self.store
                .list_spin_history(id, None, Some(SpinStatus::Claiming))
                .await?,
        );
        spins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(spins)
    }

    /// Units reserved longer than `older_than` and still unclaimed.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
    pub async fn list_stale_reservations(
        &self,
        operator: Option<&str>,
        id: CampaignId,
        older_than: Duration,
    ) -> Result<Vec<PrizeInventoryItem>, SpinError> {
        self.operators.authorize(operator)?;
        self.get_campaign_by_id(id).await?;
        self.store
            .list_stale_reservations(id, Utc::now() - older_than)
            .await
    }

    fn announce(&self, campaign: &Campaign) {
        self.event_bus.publish(SpinEvent::CampaignUpdated {
            campaign_id: campaign.id,
            active: campaign.active,
            timestamp: campaign.updated_at,
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SeededRandom;
    use crate::service::testkit::{Harness, OPERATOR, draft, message, nft};

    fn harness() -> Harness {
        Harness::new(Arc::new(SeededRandom::new(3)))
    }

    #[tokio::test]
    async fn probabilities_must_sum_to_one() {
        let h = harness();
        let result = h
            .campaigns
            .create_campaign(
                Some(OPERATOR),
                draft(vec![message("A", 0.5), message("B", 0.35)], 1),
            )
            .await;
        assert!(matches!(result, Err(SpinError::Configuration(_))));

        let Ok(stored) = h.store.list_campaigns().await else {
            panic!("list failed");
        };
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn non_operators_cannot_administer() {
        let h = harness();
        let result = h
            .campaigns
            .create_campaign(Some("0xuser"), draft(vec![message("A", 1.0)], 1))
            .await;
        assert!(matches!(result, Err(SpinError::Unauthorized(_))));

        let campaign = h.campaign(draft(vec![message("A", 1.0)], 1)).await;
        let stats = h.campaigns.get_campaign_stats(None, campaign.id).await;
        assert!(matches!(stats, Err(SpinError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn update_rejects_invalid_draft_and_keeps_old_settings() {
        let h = harness();
        let campaign = h.campaign(draft(vec![message("A", 1.0)], 1)).await;

        let result = h
            .campaigns
            .update_campaign(Some(OPERATOR), campaign.id, draft(vec![message("A", 0.2)], 5))
            .await;
        assert!(matches!(result, Err(SpinError::Configuration(_))));

        let Ok(stored) = h.campaigns.get_campaign_by_id(campaign.id).await else {
            panic!("campaign missing");
        };
        assert_eq!(stored.spins_per_wallet, 1);
    }

    #[tokio::test]
    async fn inactive_campaigns_are_not_listed() {
        let h = harness();
        let open = h.campaign(draft(vec![message("A", 1.0)], 1)).await;
        let closed = h.campaign(draft(vec![message("A", 1.0)], 1)).await;
        let Ok(_) = h
            .campaigns
            .set_campaign_active(Some(OPERATOR), closed.id, false)
            .await
        else {
            panic!("deactivation failed");
        };

        let Ok(active) = h.campaigns.get_active_campaigns().await else {
            panic!("list failed");
        };
        let ids: Vec<CampaignId> = active.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![open.id]);
    }

    #[tokio::test]
    async fn inventory_must_match_an_nft_prize() {
        let h = harness();
        let campaign = h
            .campaign(draft(
                vec![message("A", 0.5), nft("Genesis", "genesis", 0.5)],
                1,
            ))
            .await;

        let unknown = h
            .campaigns
            .add_prize_inventory(
                Some(OPERATOR),
                campaign.id,
                vec![NewInventoryUnit {
                    nft_id: "relic".to_string(),
                    token_id: None,
                }],
            )
            .await;
        assert!(matches!(unknown, Err(SpinError::InvalidRequest(_))));

        let empty = h
            .campaigns
            .add_prize_inventory(Some(OPERATOR), campaign.id, Vec::new())
            .await;
        assert!(matches!(empty, Err(SpinError::InvalidRequest(_))));

        let Ok(items) = h
            .campaigns
            .add_prize_inventory(
                Some(OPERATOR),
                campaign.id,
                vec![
                    NewInventoryUnit {
                        nft_id: "genesis".to_string(),
                        token_id: None,
                    };
                    3
                ],
            )
            .await
        else {
            panic!("stocking failed");
        };
        assert_eq!(items.len(), 3);

        let Ok(stats) = h.campaigns.get_campaign_stats(Some(OPERATOR), campaign.id).await else {
            panic!("stats failed");
        };
        assert_eq!(stats.inventory.available, 3);
    }

    #[tokio::test]
    async fn whitelist_round_trip() {
        let h = harness();
        let campaign = h.campaign(draft(vec![message("A", 1.0)], 1)).await;

        let Ok(entry) = h
            .campaigns
            .add_to_whitelist(Some(OPERATOR), campaign.id, "0xvip", 3)
            .await
        else {
            panic!("whitelist failed");
        };
        assert_eq!(entry.remaining(), 3);

        let removed = h
            .campaigns
            .remove_from_whitelist(Some(OPERATOR), campaign.id, "0xvip")
            .await;
        assert!(matches!(removed, Ok(true)));
        let again = h
            .campaigns
            .remove_from_whitelist(Some(OPERATOR), campaign.id, "0xvip")
            .await;
        assert!(matches!(again, Ok(false)));
    }

    #[tokio::test]
    async fn failed_spins_and_stale_reservations_are_listed() {
        let h = harness();
        let campaign = h
            .campaign(draft(vec![nft("Genesis", "genesis", 1.0)], 2))
            .await;
        let _ = h
            .campaigns
            .add_prize_inventory(
                Some(OPERATOR),
                campaign.id,
                vec![NewInventoryUnit {
                    nft_id: "genesis".to_string(),
                    token_id: None,
                }],
            )
            .await;
        let Ok(win) = h.spins.execute_spin(campaign.id, "0xwinner").await else {
            panic!("spin failed");
        };

        let Ok(stale) = h
            .campaigns
            .list_stale_reservations(Some(OPERATOR), campaign.id, Duration::zero() - Duration::seconds(1))
            .await
        else {
            panic!("stale listing failed");
        };
        assert_eq!(stale.len(), 1);

        let Ok(fresh) = h
            .campaigns
            .list_stale_reservations(Some(OPERATOR), campaign.id, Duration::hours(1))
            .await
        else {
            panic!("stale listing failed");
        };
        assert!(fresh.is_empty());

        h.transfer
            .fail
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let _ = h.claims.claim_prize(win.spin_id, "0xwinner").await;

        let Ok(failed) = h
            .campaigns
            .list_failed_spins(Some(OPERATOR), campaign.id)
            .await
        else {
            panic!("failed listing failed");
        };
        assert_eq!(failed.len(), 1);
        assert_eq!(failed.first().map(|s| s.id), Some(win.spin_id));
    }
}
