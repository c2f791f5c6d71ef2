//! Claim processing for reserved NFT prizes.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::require_wallet;
use crate::domain::{EventBus, PrizeOutcome, ResultSigner, SpinEvent, SpinHistoryId, SpinStatus};
use crate::error::{ClaimError, SpinError};
use crate::persistence::CampaignStore;
use crate::transfer::{NftTransfer, TransferRequest};

/// Outcome of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClaimResult {
    /// `true` once the prize is delivered (or there was nothing to deliver).
    pub success: bool,
    /// Transfer transaction hash, for NFT prizes.
    pub tx_hash: Option<String>,
}

/// Delivers reserved prizes through an [`NftTransfer`].
///
/// At most one transfer is in flight per spin: the store's `begin_claim`
/// moves the row to `claiming` before the transfer is attempted, and
/// concurrent requests for the same spin are turned away.
#[derive(Debug)]
pub struct ClaimService<S> {
    store: Arc<S>,
    event_bus: EventBus,
    signer: ResultSigner,
    transfer: Arc<dyn NftTransfer>,
}

impl<S: CampaignStore> ClaimService<S> {
    /// Creates a new `ClaimService`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        event_bus: EventBus,
        signer: ResultSigner,
        transfer: Arc<dyn NftTransfer>,
    ) -> Self {
        Self {
            store,
            event_bus,
            signer,
            transfer,
        }
    }

    /// Claims the prize of `spin_id` on behalf of `wallet_address`.
    ///
    /// Completed spins return their stored `tx_hash` without another
    /// transfer. A `failed` claim may be retried.
    ///
    /// # Errors
    ///
    /// - [`ClaimError`] variants for unknown spins, foreign wallets,
    ///   message outcomes, tampered rows and claims already in flight.
    /// - [`SpinError::TransferFailure`] if the transfer capability fails;
    ///   the unit stays reserved for the winner.
    pub async fn claim_prize(
        &self,
        spin_id: SpinHistoryId,
        wallet_address: &str,
    ) -> Result<ClaimResult, SpinError> {
        let wallet = require_wallet(wallet_address)?;
        let spin = self
            .store
            .get_spin_history(spin_id)
            .await?
            .ok_or(ClaimError::NotFound(spin_id))?;

        if spin.wallet_address != wallet {
            tracing::warn!(%spin_id, wallet, "claim by non-owner rejected");
            return Err(ClaimError::NotOwner.into());
        }

        if spin.status == SpinStatus::Completed {
            return Ok(ClaimResult {
                success: true,
                tx_hash: spin.tx_hash,
            });
        }

        let Some(PrizeOutcome::Nft {
            nft_id,
            inventory_id,
            ..
        }) = &spin.outcome
        else {
            return Err(ClaimError::NothingToClaim.into());
        };

        if !self.signer.verify(&spin)? {
            tracing::error!(%spin_id, wallet, "result hash mismatch, claim refused");
            return Err(ClaimError::Tampered.into());
        }

        if !self.store.begin_claim(spin_id, Utc::now()).await? {
            tracing::warn!(%spin_id, wallet, status = %spin.status, "claim already in progress");
            return Err(ClaimError::InProgress.into());
        }

        let item = match self.store.get_inventory_item(*inventory_id).await {
            Ok(Some(item)) if item.reserved_for_spin_history_id == Some(spin_id) => item,
            Ok(_) => {
                let message = format!("inventory unit {inventory_id} is not bound to spin");
                self.store.fail_claim(spin_id, &message, Utc::now()).await?;
                tracing::error!(%spin_id, %inventory_id, "reconciliation needed: {message}");
                return Err(SpinError::Persistence(message));
            }
            Err(err) => {
                self.store
                    .fail_claim(spin_id, &err.to_string(), Utc::now())
                    .await?;
                return Err(err);
            }
        };

        let request = TransferRequest {
            spin_id,
            campaign_id: spin.campaign_id,
            wallet_address: wallet.to_string(),
            nft_id: nft_id.clone(),
            token_id: item.transfer_token().to_string(),
        };

        match self.transfer.transfer(&request).await {
            Ok(receipt) => {
                let now = Utc::now();
                if let Err(err) = self
                    .store
                    .complete_claim(spin_id, item.id, wallet, &receipt.tx_hash, now)
                    .await
                {
                    tracing::error!(
                        %spin_id,
                        tx_hash = receipt.tx_hash.as_str(),
                        error = %err,
                        "reconciliation needed: transfer succeeded but claim not recorded"
                    );
                    return Err(err);
                }

                self.event_bus.publish(SpinEvent::PrizeClaimed {
                    campaign_id: spin.campaign_id,
                    spin_id,
                    wallet_address: wallet.to_string(),
                    tx_hash: receipt.tx_hash.clone(),
                    timestamp: now,
                });
                tracing::info!(%spin_id, wallet, tx_hash = receipt.tx_hash.as_str(), "prize claimed");
                Ok(ClaimResult {
                    success: true,
                    tx_hash: Some(receipt.tx_hash),
                })
            }
            Err(transfer_err) => {
                let message = transfer_err.to_string();
                let now = Utc::now();
                self.store.fail_claim(spin_id, &message, now).await?;
                self.event_bus.publish(SpinEvent::ClaimFailed {
                    campaign_id: spin.campaign_id,
                    spin_id,
                    error: message.clone(),
                    timestamp: now,
                });
                tracing::warn!(%spin_id, wallet, error = message.as_str(), "prize transfer failed");
                Err(SpinError::TransferFailure(message))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::domain::{Campaign, InventoryStatus, NewInventoryUnit, SeededRandom};
    use crate::service::testkit::{Harness, OPERATOR, draft, message, nft};

    async fn nft_win(h: &Harness) -> (Campaign, SpinHistoryId) {
        let campaign = h
            .campaign(draft(vec![nft("Genesis", "genesis", 1.0)], 1))
            .await;
        let Ok(_) = h
            .campaigns
            .add_prize_inventory(
                Some(OPERATOR),
                campaign.id,
                vec![NewInventoryUnit {
                    nft_id: "genesis".to_string(),
                    token_id: Some("42".to_string()),
                }],
            )
            .await
        else {
            panic!("stocking failed");
        };
        let Ok(result) = h.spins.execute_spin(campaign.id, "0xwinner").await else {
            panic!("spin failed");
        };
        assert_eq!(result.status, SpinStatus::Reserved);
        (campaign, result.spin_id)
    }

    fn harness() -> Harness {
        Harness::new(Arc::new(SeededRandom::new(1)))
    }

    #[tokio::test]
    async fn claim_is_idempotent() {
        let h = harness();
        let (campaign, spin_id) = nft_win(&h).await;

        let Ok(first) = h.claims.claim_prize(spin_id, "0xwinner").await else {
            panic!("first claim failed");
        };
        let Ok(second) = h.claims.claim_prize(spin_id, "0xwinner").await else {
            panic!("second claim failed");
        };

        assert!(first.success);
        assert_eq!(first.tx_hash.as_deref(), Some("0xtx-42-0"));
        assert_eq!(first, second);
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 1);

        let Ok(stats) = h.store.campaign_stats(campaign.id).await else {
            panic!("stats failed");
        };
        assert_eq!(stats.total_prizes_claimed, 1);
        assert_eq!(stats.inventory.claimed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_transfer_once() {
        let h = Arc::new(harness());
        let (_, spin_id) = nft_win(&h).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let h = Arc::clone(&h);
            handles.push(tokio::spawn(async move {
                h.claims.claim_prize(spin_id, "0xwinner").await
            }));
        }

        let mut hashes = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(result)) => hashes.push(result.tx_hash),
                Ok(Err(SpinError::Claim(ClaimError::InProgress))) => {}
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert!(!hashes.is_empty());
        assert!(hashes.iter().all(|h| h.as_deref() == Some("0xtx-42-0")));
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_transfer_can_be_retried() {
        let h = harness();
        let (_, spin_id) = nft_win(&h).await;
        h.transfer.fail.store(true, Ordering::SeqCst);

        let failed = h.claims.claim_prize(spin_id, "0xwinner").await;
        assert!(matches!(failed, Err(SpinError::TransferFailure(_))));

        let Ok(Some(spin)) = h.store.get_spin_history(spin_id).await else {
            panic!("spin missing");
        };
        assert_eq!(spin.status, SpinStatus::Failed);
        let Some(inventory_id) = spin.inventory_id() else {
            panic!("nft spin without unit");
        };
        let Ok(Some(unit)) = h.store.get_inventory_item(inventory_id).await else {
            panic!("unit missing");
        };
        assert_eq!(unit.status, InventoryStatus::Reserved);

        h.transfer.fail.store(false, Ordering::SeqCst);
        let Ok(retried) = h.claims.claim_prize(spin_id, "0xwinner").await else {
            panic!("retry failed");
        };
        assert_eq!(retried.tx_hash.as_deref(), Some("0xtx-42-1"));
    }

    #[tokio::test]
    async fn foreign_wallet_is_rejected() {
        let h = harness();
        let (_, spin_id) = nft_win(&h).await;

        let result = h.claims.claim_prize(spin_id, "0xthief").await;
        assert!(matches!(result, Err(SpinError::Claim(ClaimError::NotOwner))));
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_spin_is_not_found() {
        let h = harness();
        let id = SpinHistoryId::new();
        let result = h.claims.claim_prize(id, "0xwinner").await;
        assert!(matches!(
            result,
            Err(SpinError::Claim(ClaimError::NotFound(missing))) if missing == id
        ));
    }

    #[tokio::test]
    async fn completed_message_spin_claims_as_noop() {
        let h = harness();
        let mut campaign_draft = draft(vec![message("Thanks", 1.0)], 1);
        campaign_draft.name = "Messages".to_string();
        let campaign = h.campaign(campaign_draft).await;
        let Ok(result) = h.spins.execute_spin(campaign.id, "0xwallet").await else {
            panic!("spin failed");
        };

        let claim = h.claims.claim_prize(result.spin_id, "0xwallet").await;
        let Ok(claim) = claim else {
            panic!("completed message spins report success");
        };
        assert!(claim.success);
        assert_eq!(claim.tx_hash, None);
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nft_recorded_by_compensation_is_claimable() {
        let h = harness();
        let campaign = h
            .campaign(draft(vec![nft("Genesis", "genesis", 1.0)], 1))
            .await;
        let Ok(_) = h
            .campaigns
            .add_prize_inventory(
                Some(OPERATOR),
                campaign.id,
                vec![NewInventoryUnit {
                    nft_id: "genesis".to_string(),
                    token_id: Some("7".to_string()),
                }],
            )
            .await
        else {
            panic!("stocking failed");
        };

        h.store.fail_history.store(true, Ordering::SeqCst);
        let spun = h.spins.execute_spin(campaign.id, "0xwinner").await;
        assert!(matches!(spun, Err(SpinError::Persistence(_))));
        h.store.fail_history.store(false, Ordering::SeqCst);

        let Ok(rows) = h
            .store
            .list_spin_history(campaign.id, Some("0xwinner"), Some(SpinStatus::Failed))
            .await
        else {
            panic!("history failed");
        };
        let Some(row) = rows.first() else {
            panic!("compensation row missing");
        };
        assert!(row.inventory_id().is_some());

        let Ok(claim) = h.claims.claim_prize(row.id, "0xwinner").await else {
            panic!("claim on compensation row failed");
        };
        assert!(claim.success);
        assert_eq!(claim.tx_hash.as_deref(), Some("0xtx-7-0"));
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrecorded_claim_stays_claiming_and_is_listed() {
        let h = harness();
        let (campaign, spin_id) = nft_win(&h).await;
        h.store.fail_complete_claim.store(true, Ordering::SeqCst);

        let first = h.claims.claim_prize(spin_id, "0xwinner").await;
        assert!(matches!(first, Err(SpinError::Persistence(_))));
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 1);

        let Ok(Some(spin)) = h.store.get_spin_history(spin_id).await else {
            panic!("spin missing");
        };
        assert_eq!(spin.status, SpinStatus::Claiming);

        h.store.fail_complete_claim.store(false, Ordering::SeqCst);
        let retry = h.claims.claim_prize(spin_id, "0xwinner").await;
        assert!(matches!(retry, Err(SpinError::Claim(ClaimError::InProgress))));
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 1);

        let Ok(listed) = h
            .campaigns
            .list_failed_spins(Some(OPERATOR), campaign.id)
            .await
        else {
            panic!("reconciliation listing failed");
        };
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().map(|s| s.status), Some(SpinStatus::Claiming));
    }

    #[tokio::test]
    async fn tampered_outcome_is_refused() {
        let h = harness();
        let (_, spin_id) = nft_win(&h).await;

        let Ok(Some(mut spin)) = h.store.get_spin_history(spin_id).await else {
            panic!("spin missing");
        };
        spin.id = SpinHistoryId::new();
        spin.outcome = Some(PrizeOutcome::Nft {
            label: "Grand prize".to_string(),
            nft_id: "genesis".to_string(),
            inventory_id: spin.inventory_id().unwrap_or_default(),
            token_id: None,
        });
        let _ = h.store.insert_spin_history(&spin).await;

        let result = h.claims.claim_prize(spin.id, "0xwinner").await;
        assert!(matches!(result, Err(SpinError::Claim(ClaimError::Tampered))));
        assert_eq!(h.transfer.calls.load(Ordering::SeqCst), 0);
    }
}
