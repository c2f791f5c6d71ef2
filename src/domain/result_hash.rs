//! Tamper evidence for spin results.
//!
//! The result hash is an HMAC-SHA256 over the campaign, wallet, spin
//! timestamp and outcome descriptor, keyed by a server-held secret. It is
//! recomputed at claim time, so a client cannot present a forged outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{CampaignId, PrizeOutcome, SpinHistory};
use crate::error::SpinError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies spin result hashes.
#[derive(Clone)]
pub struct ResultSigner {
    key: Vec<u8>,
}

impl fmt::Debug for ResultSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl ResultSigner {
    /// Creates a signer from a server secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    fn mac(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        created_at: DateTime<Utc>,
        outcome: Option<&PrizeOutcome>,
    ) -> Result<HmacSha256, SpinError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| SpinError::Internal(format!("invalid result hash key: {e}")))?;
        let descriptor = outcome.map(PrizeOutcome::descriptor).unwrap_or_default();
        let micros = created_at.timestamp_micros().to_string();
        let campaign = campaign_id.to_string();
        for field in [
            campaign.as_bytes(),
            wallet_address.as_bytes(),
            micros.as_bytes(),
            descriptor.as_bytes(),
        ] {
            mac.update(&(field.len() as u64).to_be_bytes());
            mac.update(field);
        }
        Ok(mac)
    }

    /// Computes the hex-encoded result hash.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Internal`] if the key is rejected by the MAC.
    pub fn sign(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        created_at: DateTime<Utc>,
        outcome: Option<&PrizeOutcome>,
    ) -> Result<String, SpinError> {
        let mac = self.mac(campaign_id, wallet_address, created_at, outcome)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Recomputes the hash of a stored spin and compares it in constant
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Internal`] if the key is rejected by the MAC.
    pub fn verify(&self, spin: &SpinHistory) -> Result<bool, SpinError> {
        let Ok(expected) = hex::decode(&spin.result_hash) else {
            return Ok(false);
        };
        let mac = self.mac(
            spin.campaign_id,
            &spin.wallet_address,
            spin.created_at,
            spin.outcome.as_ref(),
        )?;
        Ok(mac.verify_slice(&expected).is_ok())
    }
}
