//! NFT transfer capability.
//!
//! Claims hand a reserved inventory unit to an [`NftTransfer`]
//! implementation. The gateway never signs or submits transactions itself;
//! [`RelayTransfer`] forwards the request to an external relay service over
//! HTTP and expects a transaction hash back.

use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::domain::{CampaignId, SpinHistoryId};

/// One transfer of a reserved unit to its winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    /// Spin being claimed. Relays may use it as an idempotency key.
    pub spin_id: SpinHistoryId,
    /// Campaign the unit belongs to.
    pub campaign_id: CampaignId,
    /// Recipient wallet.
    pub wallet_address: String,
    /// Inventory pool key.
    pub nft_id: String,
    /// Concrete token to transfer.
    pub token_id: String,
}

/// Proof of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferReceipt {
    /// On-chain transaction hash.
    pub tx_hash: String,
}

/// Failure reported by a transfer implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// No relay endpoint is configured.
    #[error("no transfer relay configured")]
    NotConfigured,

    /// The relay could not be reached or timed out.
    #[error("transfer relay unreachable: {0}")]
    Transport(String),

    /// The relay answered with a non-success status.
    #[error("transfer relay rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the relay.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The relay answered with a body that is not a receipt.
    #[error("invalid transfer relay response: {0}")]
    InvalidResponse(String),
}

/// Moves a prize to a wallet.
pub trait NftTransfer: Send + Sync + std::fmt::Debug {
    /// Transfers the unit described by `request`.
    fn transfer<'a>(
        &'a self,
        request: &'a TransferRequest,
    ) -> BoxFuture<'a, Result<TransferReceipt, TransferError>>;
}

/// Transfer used when no relay is configured. Every claim fails and stays
/// retryable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTransfer;

impl NftTransfer for DisabledTransfer {
    fn transfer<'a>(
        &'a self,
        _request: &'a TransferRequest,
    ) -> BoxFuture<'a, Result<TransferReceipt, TransferError>> {
        async { Err(TransferError::NotConfigured) }.boxed()
    }
}

/// HTTP client for an external transfer relay.
///
/// Sends `POST {endpoint}` with a JSON [`TransferRequest`] and expects
/// `{"tx_hash": "..."}` on success.
#[derive(Debug, Clone)]
pub struct RelayTransfer {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayTransfer {
    /// Creates a relay client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransferError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn post(&self, request: &TransferRequest) -> Result<TransferReceipt, TransferError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransferError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let receipt: TransferReceipt = response
            .json()
            .await
            .map_err(|e| TransferError::InvalidResponse(e.to_string()))?;
        if receipt.tx_hash.trim().is_empty() {
            return Err(TransferError::InvalidResponse(
                "empty tx_hash".to_string(),
            ));
        }
        Ok(receipt)
    }
}

impl NftTransfer for RelayTransfer {
    fn transfer<'a>(
        &'a self,
        request: &'a TransferRequest,
    ) -> BoxFuture<'a, Result<TransferReceipt, TransferError>> {
        self.post(request).boxed()
    }
}
