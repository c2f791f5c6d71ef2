//! Spin orchestration: eligibility, ledger, draw, reservation, history.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::require_wallet;
use crate::domain::selector::{select_prize, visual_segment_index};
use crate::domain::{
    Campaign, CampaignId, EventBus, PrizeDefinition, PrizeInventoryItem, PrizeOutcome,
    RandomSource, ResultSigner, SpinBudget, SpinEvent, SpinHistory, SpinHistoryId, SpinStatus,
};
use crate::error::SpinError;
use crate::persistence::CampaignStore;

/// Whether a wallet may spin right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Eligibility {
    /// `true` if a spin would be granted.
    pub can_spin: bool,
    /// Spins the wallet has left.
    pub spins_remaining: u32,
    /// Why the wallet cannot spin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Eligibility {
    fn denied(reason: &str, spins_remaining: u32) -> Self {
        Self {
            can_spin: false,
            spins_remaining,
            reason: Some(reason.to_string()),
        }
    }

    fn from_remaining(spins_remaining: u32) -> Self {
        if spins_remaining == 0 {
            Self::denied("no spins remaining", 0)
        } else {
            Self {
                can_spin: true,
                spins_remaining,
                reason: None,
            }
        }
    }
}

/// Outcome of one spin as returned to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SpinResult {
    /// History row identifier, used to claim NFT prizes.
    pub spin_id: SpinHistoryId,
    /// The wheel segment that was drawn.
    pub prize: PrizeDefinition,
    /// What was awarded. Differs from `prize` when an NFT was sold out.
    pub prize_result_data: PrizeOutcome,
    /// `reserved` for NFT wins, `completed` otherwise.
    pub status: SpinStatus,
    /// Spins left after this one.
    pub spins_remaining: u32,
    /// Wheel position to animate to.
    pub visual_segment_index: Option<u32>,
    /// Tamper-evidence token.
    pub result_hash: String,
}

/// A drawn prize and what it resolved to.
#[derive(Debug)]
struct Draw {
    prize: PrizeDefinition,
    outcome: PrizeOutcome,
    status: SpinStatus,
    visual_segment_index: Option<u32>,
    reserved: Option<PrizeInventoryItem>,
}

/// Runs spins against a [`CampaignStore`].
///
/// A spin is final once the ledger grants it: every later failure is
/// recorded as a `failed` history row and the spin is never refunded.
#[derive(Debug)]
pub struct SpinService<S> {
    store: Arc<S>,
    event_bus: EventBus,
    signer: ResultSigner,
    random: Arc<dyn RandomSource>,
}

impl<S: CampaignStore> SpinService<S> {
    /// Creates a new `SpinService`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        event_bus: EventBus,
        signer: ResultSigner,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            event_bus,
            signer,
            random,
        }
    }

    /// Reports whether `wallet_address` may spin in the campaign.
    ///
    /// Read-only; a positive answer is advisory because the ledger decides
    /// at spin time.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::InvalidRequest`] for an empty wallet and
    /// [`SpinError::Persistence`] on storage failure.
    pub async fn check_eligibility(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<Eligibility, SpinError> {
        let wallet = require_wallet(wallet_address)?;
        let Some(campaign) = self.store.get_campaign(campaign_id).await? else {
            return Ok(Eligibility::denied("campaign not found", 0));
        };
        if let Err(reason) = campaign.check_window(Utc::now()) {
            return Ok(Eligibility::denied(reason, 0));
        }

        let remaining = match campaign.budget() {
            SpinBudget::Whitelist => {
                match self.store.get_whitelist_entry(campaign_id, wallet).await? {
                    Some(entry) => entry.remaining(),
                    None => return Ok(Eligibility::denied("wallet is not whitelisted", 0)),
                }
            }
            SpinBudget::PerWallet(limit) => {
                let used = self.store.wallet_spins_used(campaign_id, wallet).await?;
                limit.saturating_sub(used)
            }
        };
        Ok(Eligibility::from_remaining(remaining))
    }

    /// Consumes one spin and records its outcome.
    ///
    /// # Errors
    ///
    /// - [`SpinError::CampaignNotFound`] if the campaign does not exist.
    /// - [`SpinError::Eligibility`] if the campaign refuses spins or the
    ///   wallet has none left (including lost races).
    /// - [`SpinError::Configuration`] if the campaign has no prizes.
    /// - [`SpinError::Persistence`] if the outcome could not be recorded
    ///   after the spin was consumed.
    pub async fn execute_spin(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<SpinResult, SpinError> {
        let wallet = require_wallet(wallet_address)?;
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .ok_or(SpinError::CampaignNotFound(campaign_id))?;
        campaign
            .check_window(Utc::now())
            .map_err(|reason| SpinError::Eligibility(reason.to_string()))?;
        if campaign.prizes.is_empty() {
            return Err(SpinError::Configuration(
                "campaign has no prizes".to_string(),
            ));
        }

        let consumption = self
            .store
            .consume_spin(campaign_id, wallet, campaign.budget())
            .await?;
        if !consumption.allowed {
            return Err(self.refusal(&campaign, wallet).await);
        }

        let spin_id = SpinHistoryId::new();
        let created_at = Utc::now().trunc_subsecs(6);

        let draw = match self.draw(&campaign, wallet, spin_id, created_at).await {
            Ok(draw) => draw,
            Err(err) => {
                self.compensate(&campaign, wallet, spin_id, None, &err, created_at)
                    .await;
                return Err(err);
            }
        };

        let recorded = self.record(&campaign, wallet, spin_id, created_at, &draw).await;
        let spin = match recorded {
            Ok(spin) => spin,
            Err(err) => {
                self.compensate(
                    &campaign,
                    wallet,
                    spin_id,
                    Some(draw.outcome),
                    &err,
                    created_at,
                )
                .await;
                return Err(err);
            }
        };

        self.publish(&spin, &draw);
        tracing::info!(
            %campaign_id,
            wallet,
            %spin_id,
            prize = draw.outcome.label(),
            status = %draw.status,
            "spin executed"
        );

        Ok(SpinResult {
            spin_id,
            prize: draw.prize,
            prize_result_data: draw.outcome,
            status: draw.status,
            spins_remaining: consumption.spins_remaining,
            visual_segment_index: draw.visual_segment_index,
            result_hash: spin.result_hash,
        })
    }

    /// Lists the spin history of a campaign, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::CampaignNotFound`] for an unknown campaign.
    pub async fn get_spin_history(
        &self,
        campaign_id: CampaignId,
        wallet_address: Option<&str>,
    ) -> Result<Vec<SpinHistory>, SpinError> {
        if self.store.get_campaign(campaign_id).await?.is_none() {
            return Err(SpinError::CampaignNotFound(campaign_id));
        }
        let wallet = wallet_address.map(require_wallet).transpose()?;
        self.store
            .list_spin_history(campaign_id, wallet, None)
            .await
    }

    async fn refusal(&self, campaign: &Campaign, wallet: &str) -> SpinError {
        let not_listed = campaign.require_whitelist
            && matches!(
                self.store.get_whitelist_entry(campaign.id, wallet).await,
                Ok(None)
            );
        let reason = if not_listed {
            "wallet is not whitelisted"
        } else {
            "no spins remaining"
        };
        tracing::warn!(campaign_id = %campaign.id, wallet, reason, "spin refused");
        SpinError::Eligibility(reason.to_string())
    }

    async fn draw(
        &self,
        campaign: &Campaign,
        wallet: &str,
        spin_id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> Result<Draw, SpinError> {
        let prize = select_prize(&campaign.prizes, self.random.as_ref())
            .ok_or_else(|| SpinError::Configuration("campaign has no prizes".to_string()))?
            .clone();
        let visual_segment_index =
            visual_segment_index(&campaign.prizes, &prize, self.random.as_ref())
                .and_then(|i| u32::try_from(i).ok());

        let (outcome, status, reserved) = match &prize {
            PrizeDefinition::Message { label, message, .. } => (
                PrizeOutcome::Message {
                    label: label.clone(),
                    message: message.clone().unwrap_or_else(|| label.clone()),
                    fallback_for: None,
                },
                SpinStatus::Completed,
                None,
            ),
            PrizeDefinition::Nft {
                label,
                nft_id,
                fallback_message,
                ..
            } => {
                let reserved = self
                    .store
                    .reserve_inventory(campaign.id, nft_id, wallet, spin_id, now)
                    .await?;
                match reserved {
                    Some(item) => (
                        PrizeOutcome::Nft {
                            label: label.clone(),
                            nft_id: nft_id.clone(),
                            inventory_id: item.id,
                            token_id: item.token_id.clone(),
                        },
                        SpinStatus::Reserved,
                        Some(item),
                    ),
                    None => {
                        tracing::info!(
                            campaign_id = %campaign.id,
                            nft_id = nft_id.as_str(),
                            "inventory exhausted, awarding fallback"
                        );
                        (
                            PrizeOutcome::Message {
                                label: label.clone(),
                                message: fallback_message.clone(),
                                fallback_for: Some(nft_id.clone()),
                            },
                            SpinStatus::Completed,
                            None,
                        )
                    }
                }
            }
        };

        Ok(Draw {
            prize,
            outcome,
            status,
            visual_segment_index,
            reserved,
        })
    }

    async fn record(
        &self,
        campaign: &Campaign,
        wallet: &str,
        spin_id: SpinHistoryId,
        created_at: DateTime<Utc>,
        draw: &Draw,
    ) -> Result<SpinHistory, SpinError> {
        let result_hash =
            self.signer
                .sign(campaign.id, wallet, created_at, Some(&draw.outcome))?;
        let spin = SpinHistory {
            id: spin_id,
            campaign_id: campaign.id,
            wallet_address: wallet.to_string(),
            outcome: Some(draw.outcome.clone()),
            status: draw.status,
            tx_hash: None,
            error_message: None,
            result_hash,
            visual_segment_index: draw.visual_segment_index,
            created_at,
            updated_at: created_at,
        };
        self.store.insert_spin_history(&spin).await?;
        Ok(spin)
    }

    async fn compensate(
        &self,
        campaign: &Campaign,
        wallet: &str,
        spin_id: SpinHistoryId,
        outcome: Option<PrizeOutcome>,
        cause: &SpinError,
        created_at: DateTime<Utc>,
    ) {
        tracing::warn!(
            campaign_id = %campaign.id,
            wallet,
            %spin_id,
            error = %cause,
            "spin consumed but outcome not recorded"
        );
        let result_hash = match self
            .signer
            .sign(campaign.id, wallet, created_at, outcome.as_ref())
        {
            Ok(hash) => hash,
            Err(err) => {
                tracing::error!(%spin_id, error = %err, "compensation row left unsigned");
                String::new()
            }
        };
        let mut row = SpinHistory::compensation(
            spin_id,
            campaign.id,
            wallet.to_string(),
            outcome,
            cause.to_string(),
            created_at,
        );
        row.result_hash = result_hash;
        if let Err(err) = self.store.insert_spin_history(&row).await {
            tracing::error!(
                campaign_id = %campaign.id,
                wallet,
                %spin_id,
                error = %err,
                cause = %cause,
                "reconciliation needed: consumed spin has no history row"
            );
        }
    }

    fn publish(&self, spin: &SpinHistory, draw: &Draw) {
        self.event_bus.publish(SpinEvent::SpinExecuted {
            campaign_id: spin.campaign_id,
            spin_id: spin.id,
            wallet_address: spin.wallet_address.clone(),
            prize_type: draw.outcome.prize_type(),
            label: draw.outcome.label().to_string(),
            status: draw.status,
            timestamp: spin.created_at,
        });
        if let Some(item) = &draw.reserved {
            self.event_bus.publish(SpinEvent::PrizeReserved {
                campaign_id: spin.campaign_id,
                spin_id: spin.id,
                inventory_id: item.id,
                nft_id: item.nft_id.clone(),
                timestamp: spin.created_at,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::Ordering;

    use proptest::prelude::*;

    use super::*;
    use crate::domain::{NewInventoryUnit, PrizeType, ScriptedRandom, SeededRandom};
    use crate::service::testkit::{Harness, OPERATOR, draft, message, nft};

    fn seeded() -> Harness {
        Harness::new(Arc::new(SeededRandom::new(42)))
    }

    async fn stock(h: &Harness, campaign: &Campaign, nft_id: &str, units: usize) {
        let units = (0..units)
            .map(|i| NewInventoryUnit {
                nft_id: nft_id.to_string(),
                token_id: Some(format!("{nft_id}-{i}")),
            })
            .collect();
        let Ok(_) = h
            .campaigns
            .add_prize_inventory(Some(OPERATOR), campaign.id, units)
            .await
        else {
            panic!("stocking failed");
        };
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_spins_respect_budget() {
        let h = Arc::new(seeded());
        let campaign = h.campaign(draft(vec![message("Thanks", 1.0)], 3)).await;

        let mut handles = Vec::new();
        for _ in 0..25 {
            let h = Arc::clone(&h);
            let id = campaign.id;
            handles.push(tokio::spawn(async move {
                h.spins.execute_spin(id, "0xwallet").await
            }));
        }

        let mut granted = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => granted += 1,
                Ok(Err(SpinError::Eligibility(_))) => refused += 1,
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert_eq!(granted, 3);
        assert_eq!(refused, 22);

        let Ok(history) = h.spins.get_spin_history(campaign.id, Some("0xwallet")).await else {
            panic!("history failed");
        };
        assert_eq!(history.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_unit_goes_to_one_winner() {
        let h = Arc::new(seeded());
        let campaign = h
            .campaign(draft(vec![nft("Genesis", "genesis", 1.0)], 1))
            .await;
        stock(&h, &campaign, "genesis", 1).await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let h = Arc::clone(&h);
            let id = campaign.id;
            handles.push(tokio::spawn(async move {
                h.spins.execute_spin(id, &format!("0xw{i}")).await
            }));
        }

        let mut reserved = 0;
        let mut fallbacks = 0;
        for handle in handles {
            let Ok(Ok(result)) = handle.await else {
                panic!("spin failed");
            };
            match result.status {
                SpinStatus::Reserved => reserved += 1,
                SpinStatus::Completed => {
                    assert!(matches!(
                        result.prize_result_data,
                        PrizeOutcome::Message { fallback_for: Some(ref id), .. } if id == "genesis"
                    ));
                    fallbacks += 1;
                }
                other => panic!("unexpected status {other}"),
            }
        }
        assert_eq!(reserved, 1);
        assert_eq!(fallbacks, 19);

        let Ok(stats) = h.store.campaign_stats(campaign.id).await else {
            panic!("stats failed");
        };
        assert_eq!(stats.inventory.reserved, 1);
        assert_eq!(stats.inventory.available, 0);
        assert_eq!(stats.total_spins_used, 20);
    }

    #[tokio::test]
    async fn forced_nft_draw_falls_back_when_sold_out() {
        let h = Harness::new(Arc::new(ScriptedRandom::new(vec![0.95, 0.0])));
        let campaign = h
            .campaign(draft(
                vec![message("Thanks", 0.9), nft("Genesis", "genesis", 0.1)],
                2,
            ))
            .await;
        stock(&h, &campaign, "genesis", 1).await;

        let Ok(first) = h.spins.execute_spin(campaign.id, "0xfirst").await else {
            panic!("first spin failed");
        };
        assert_eq!(first.status, SpinStatus::Reserved);

        let Ok(result) = h.spins.execute_spin(campaign.id, "0xwallet").await else {
            panic!("spin failed");
        };
        assert_eq!(result.status, SpinStatus::Completed);
        assert_eq!(result.prize.prize_type(), PrizeType::Nft);
        assert_eq!(
            result.prize_result_data,
            PrizeOutcome::Message {
                label: "Genesis".to_string(),
                message: "Genesis is sold out".to_string(),
                fallback_for: Some("genesis".to_string()),
            }
        );
        assert_eq!(result.visual_segment_index, Some(1));
        assert_eq!(result.spins_remaining, 1);
    }

    #[tokio::test]
    async fn forced_nft_draw_reserves_when_stocked() {
        let h = Harness::new(Arc::new(ScriptedRandom::new(vec![0.95, 0.0])));
        let campaign = h
            .campaign(draft(
                vec![message("Thanks", 0.9), nft("Genesis", "genesis", 0.1)],
                1,
            ))
            .await;
        stock(&h, &campaign, "genesis", 2).await;
        let mut events = h.events.subscribe();

        let Ok(result) = h.spins.execute_spin(campaign.id, "0xwallet").await else {
            panic!("spin failed");
        };
        assert_eq!(result.status, SpinStatus::Reserved);
        let PrizeOutcome::Nft { token_id, .. } = &result.prize_result_data else {
            panic!("expected nft outcome");
        };
        assert_eq!(token_id.as_deref(), Some("genesis-0"));

        assert!(matches!(events.recv().await, Ok(SpinEvent::SpinExecuted { .. })));
        assert!(matches!(events.recv().await, Ok(SpinEvent::PrizeReserved { .. })));
    }

    #[tokio::test]
    async fn refused_spins_explain_why() {
        let h = seeded();
        let mut whitelisted = draft(vec![message("Thanks", 1.0)], 0);
        whitelisted.require_whitelist = true;
        let campaign = h.campaign(whitelisted).await;

        let result = h.spins.execute_spin(campaign.id, "0xstranger").await;
        let Err(SpinError::Eligibility(reason)) = result else {
            panic!("expected eligibility error");
        };
        assert_eq!(reason, "wallet is not whitelisted");

        let mut closed = draft(vec![message("Thanks", 1.0)], 1);
        closed.active = false;
        let closed = h.campaign(closed).await;
        let result = h.spins.execute_spin(closed.id, "0xwallet").await;
        assert!(matches!(result, Err(SpinError::Eligibility(r)) if r == "campaign is not active"));

        let missing = h.spins.execute_spin(CampaignId::new(), "0xwallet").await;
        assert!(matches!(missing, Err(SpinError::CampaignNotFound(_))));
    }

    #[tokio::test]
    async fn eligibility_tracks_usage() {
        let h = seeded();
        let campaign = h.campaign(draft(vec![message("Thanks", 1.0)], 2)).await;

        let Ok(before) = h.spins.check_eligibility(campaign.id, "0xwallet").await else {
            panic!("eligibility failed");
        };
        assert!(before.can_spin);
        assert_eq!(before.spins_remaining, 2);

        let _ = h.spins.execute_spin(campaign.id, "0xwallet").await;
        let _ = h.spins.execute_spin(campaign.id, "0xwallet").await;

        let Ok(after) = h.spins.check_eligibility(campaign.id, "0xwallet").await else {
            panic!("eligibility failed");
        };
        assert_eq!(after, Eligibility::denied("no spins remaining", 0));

        let Ok(unknown) = h.spins.check_eligibility(CampaignId::new(), "0xwallet").await else {
            panic!("eligibility failed");
        };
        assert_eq!(unknown.reason.as_deref(), Some("campaign not found"));
    }

    #[tokio::test]
    async fn whitelist_eligibility_uses_entry() {
        let h = seeded();
        let mut whitelisted = draft(vec![message("Thanks", 1.0)], 0);
        whitelisted.require_whitelist = true;
        let campaign = h.campaign(whitelisted).await;
        let _ = h
            .campaigns
            .add_to_whitelist(Some(OPERATOR), campaign.id, "0xvip", 2)
            .await;

        let Ok(vip) = h.spins.check_eligibility(campaign.id, "0xvip").await else {
            panic!("eligibility failed");
        };
        assert_eq!(vip.spins_remaining, 2);

        let Ok(result) = h.spins.execute_spin(campaign.id, "0xvip").await else {
            panic!("spin failed");
        };
        assert_eq!(result.spins_remaining, 1);
    }

    #[tokio::test]
    async fn failed_recording_leaves_compensation_row() {
        let h = seeded();
        let campaign = h.campaign(draft(vec![message("Thanks", 1.0)], 2)).await;
        h.store.fail_history.store(true, Ordering::SeqCst);

        let result = h.spins.execute_spin(campaign.id, "0xwallet").await;
        assert!(matches!(result, Err(SpinError::Persistence(_))));

        let Ok(failed) = h
            .store
            .list_spin_history(campaign.id, Some("0xwallet"), Some(SpinStatus::Failed))
            .await
        else {
            panic!("history failed");
        };
        assert_eq!(failed.len(), 1);
        assert!(failed.iter().all(|s| s.outcome.is_some()));

        let Ok(eligibility) = h.spins.check_eligibility(campaign.id, "0xwallet").await else {
            panic!("eligibility failed");
        };
        assert_eq!(eligibility.spins_remaining, 1);
    }

    #[tokio::test]
    async fn result_hash_verifies() {
        let h = seeded();
        let campaign = h.campaign(draft(vec![message("Thanks", 1.0)], 1)).await;
        let Ok(result) = h.spins.execute_spin(campaign.id, "0xwallet").await else {
            panic!("spin failed");
        };
        let Ok(Some(stored)) = h.store.get_spin_history(result.spin_id).await else {
            panic!("history missing");
        };
        assert_eq!(stored.result_hash, result.result_hash);
        assert!(matches!(
            ResultSigner::new("test-secret").verify(&stored),
            Ok(true)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn granted_spins_equal_min_of_requests_and_budget(budget in 0u32..6, requests in 0usize..12) {
            let granted = tokio_test::block_on(async {
                let h = seeded();
                let campaign = h.campaign(draft(vec![message("Thanks", 1.0)], budget)).await;
                let spins = (0..requests).map(|_| h.spins.execute_spin(campaign.id, "0xwallet"));
                futures_util::future::join_all(spins)
                    .await
                    .into_iter()
                    .filter(Result::is_ok)
                    .count()
            });
            prop_assert_eq!(granted, requests.min(budget as usize));
        }
    }
}
