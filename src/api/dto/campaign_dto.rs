//! Campaign catalogue and spin DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{Campaign, SpinHistory};

/// Response body for `GET /campaigns`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignListResponse {
    /// Campaigns currently accepting spins.
    pub data: Vec<Campaign>,
}

/// Optional request body for `POST /campaigns/:id/spin`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SpinRequest {
    /// Spinning wallet. The `x-wallet-address` header takes precedence.
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// Paginated response for `GET /campaigns/:id/history`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpinHistoryResponse {
    /// Spin records, newest first.
    pub data: Vec<SpinHistory>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Optional request body for `POST /spins/:id/claim`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Claiming wallet. The `x-wallet-address` header takes precedence.
    #[serde(default)]
    pub wallet_address: Option<String>,
}
