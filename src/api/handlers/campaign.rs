//! Public campaign handlers: catalogue, eligibility, spin, history.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{optional_json, resolve_wallet};
use crate::api::dto::{
    CampaignListResponse, PaginationParams, SpinHistoryResponse, SpinRequest, WalletQuery,
};
use crate::app_state::AppState;
use crate::domain::{Campaign, CampaignId};
use crate::error::{ErrorResponse, SpinError};
use crate::service::{Eligibility, SpinResult};

/// `GET /campaigns`: List campaigns currently accepting spins.
///
/// # Errors
///
/// Returns [`SpinError::Persistence`] if the store fails.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns",
    tag = "Campaigns",
    summary = "List active campaigns",
    description = "Returns campaigns that are active and inside their spin window.",
    responses(
        (status = 200, description = "Active campaigns", body = CampaignListResponse),
    )
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, SpinError> {
    let data = state.campaign_service.get_active_campaigns().await?;
    Ok(Json(CampaignListResponse { data }))
}

/// `GET /campaigns/:id`: Get one campaign.
///
/// # Errors
///
/// Returns [`SpinError::CampaignNotFound`] if the campaign does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}",
    tag = "Campaigns",
    summary = "Get campaign details",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Campaign details", body = Campaign),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, SpinError> {
    let campaign = state
        .campaign_service
        .get_campaign_by_id(CampaignId::from_uuid(id))
        .await?;
    Ok(Json(campaign))
}

/// `GET /campaigns/:id/eligibility`: Can this wallet spin now?
///
/// # Errors
///
/// Returns [`SpinError::InvalidRequest`] without a wallet and
/// [`SpinError::CampaignNotFound`] for an unknown campaign.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/eligibility",
    tag = "Campaigns",
    summary = "Check spin eligibility",
    description = "Reports whether the wallet may spin and how many spins it has left. Reading eligibility never consumes a spin.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
        WalletQuery,
    ),
    responses(
        (status = 200, description = "Eligibility", body = Eligibility),
        (status = 400, description = "Missing wallet", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn check_eligibility(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<WalletQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SpinError> {
    let wallet = resolve_wallet(&headers, query.wallet)?;
    let eligibility = state
        .spin_service
        .check_eligibility(CampaignId::from_uuid(id), &wallet)
        .await?;
    Ok(Json(eligibility))
}

/// `POST /campaigns/:id/spin`: Spend one spin and draw a prize.
///
/// # Errors
///
/// Returns [`SpinError::Eligibility`] when the wallet may not spin,
/// [`SpinError::Configuration`] for a campaign without prizes and
/// [`SpinError::Persistence`] if the outcome could not be recorded.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/spin",
    tag = "Campaigns",
    summary = "Spin the wheel",
    description = "Consumes one spin and returns the drawn prize. A sold-out NFT falls back to the campaign's message prize. The wallet comes from the `x-wallet-address` header or the body.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body(content = SpinRequest, description = "Optional; may be empty when the header is set"),
    responses(
        (status = 200, description = "Spin outcome", body = SpinResult),
        (status = 400, description = "Missing wallet", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
        (status = 409, description = "Not eligible", body = ErrorResponse),
        (status = 422, description = "Campaign misconfigured", body = ErrorResponse),
    )
)]
pub async fn execute_spin(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, SpinError> {
    let req: SpinRequest = optional_json(&body)?;
    let wallet = resolve_wallet(&headers, req.wallet_address)?;
    let result = state
        .spin_service
        .execute_spin(CampaignId::from_uuid(id), &wallet)
        .await?;
    Ok(Json(result))
}

/// `GET /campaigns/:id/history`: Spin history, optionally for one wallet.
///
/// # Errors
///
/// Returns [`SpinError::CampaignNotFound`] for an unknown campaign.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/history",
    tag = "Campaigns",
    summary = "Spin history",
    description = "Returns recorded spins for the campaign, newest first. Filtered to one wallet when `wallet` or the `x-wallet-address` header is given.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
        WalletQuery,
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Paginated spin history", body = SpinHistoryResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn spin_history(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<WalletQuery>,
    Query(page): Query<PaginationParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SpinError> {
    let wallet = resolve_wallet(&headers, query.wallet).ok();
    let history = state
        .spin_service
        .get_spin_history(CampaignId::from_uuid(id), wallet.as_deref())
        .await?;
    let (data, pagination) = page.paginate(history);
    Ok(Json(SpinHistoryResponse { data, pagination }))
}

/// Public campaign routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(list_campaigns))
        .route("/campaigns/{id}", get(get_campaign))
        .route("/campaigns/{id}/eligibility", get(check_eligibility))
        .route("/campaigns/{id}/spin", post(execute_spin))
        .route("/campaigns/{id}/history", get(spin_history))
}
