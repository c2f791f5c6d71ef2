//! Operator handlers: campaign setup, whitelist, inventory, reports.
//!
//! Every route reads the operator's wallet from the `x-operator-address`
//! header and is rejected with 403 unless the operator policy allows it.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use super::{OPERATOR_HEADER, header_str};
use crate::api::dto::{
    FailedSpinsResponse, InventoryRequest, InventoryResponse, SetActiveRequest, StaleQuery,
    WhitelistRemovalResponse, WhitelistRequest,
};
use crate::app_state::AppState;
use crate::domain::{Campaign, CampaignDraft, CampaignId, WhitelistEntry};
use crate::error::{ErrorResponse, SpinError};
use crate::persistence::CampaignStats;

/// `POST /admin/campaigns`: Create a campaign.
///
/// # Errors
///
/// Returns [`SpinError::Unauthorized`] for non-operators and
/// [`SpinError::Configuration`] if the prize probabilities do not sum to 1.
#[utoipa::path(
    post,
    path = "/api/v1/admin/campaigns",
    tag = "Admin",
    summary = "Create a campaign",
    description = "Validates the prize list (probabilities must sum to 1.0 within 0.001) and stores the campaign.",
    request_body = CampaignDraft,
    responses(
        (status = 201, description = "Campaign created", body = Campaign),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 422, description = "Invalid prize configuration", body = ErrorResponse),
    )
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<CampaignDraft>,
) -> Result<impl IntoResponse, SpinError> {
    let campaign = state
        .campaign_service
        .create_campaign(header_str(&headers, OPERATOR_HEADER), draft)
        .await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// `PUT /admin/campaigns/:id`: Replace a campaign's settings.
///
/// # Errors
///
/// Returns [`SpinError::CampaignNotFound`] for an unknown campaign plus the
/// errors of [`create_campaign`].
#[utoipa::path(
    put,
    path = "/api/v1/admin/campaigns/{id}",
    tag = "Admin",
    summary = "Update a campaign",
    description = "Replaces the campaign settings. Spin and claim counters are kept.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = CampaignDraft,
    responses(
        (status = 200, description = "Campaign updated", body = Campaign),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
        (status = 422, description = "Invalid prize configuration", body = ErrorResponse),
    )
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(draft): Json<CampaignDraft>,
) -> Result<impl IntoResponse, SpinError> {
    let campaign = state
        .campaign_service
        .update_campaign(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
            draft,
        )
        .await?;
    Ok(Json(campaign))
}

/// `POST /admin/campaigns/:id/active`: Open or close a campaign.
///
/// # Errors
///
/// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/admin/campaigns/{id}/active",
    tag = "Admin",
    summary = "Toggle campaign activity",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Campaign updated", body = Campaign),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn set_campaign_active(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, SpinError> {
    let campaign = state
        .campaign_service
        .set_campaign_active(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
            req.active,
        )
        .await?;
    Ok(Json(campaign))
}

/// `PUT /admin/campaigns/:id/whitelist`: Allow a wallet or change its allowance.
///
/// # Errors
///
/// Returns [`SpinError::InvalidRequest`] if the allowance would drop below
/// spins already used, plus the authorization and lookup errors.
#[utoipa::path(
    put,
    path = "/api/v1/admin/campaigns/{id}/whitelist",
    tag = "Admin",
    summary = "Upsert a whitelist entry",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = WhitelistRequest,
    responses(
        (status = 200, description = "Whitelist entry", body = WhitelistEntry),
        (status = 400, description = "Allowance below spins used", body = ErrorResponse),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn add_to_whitelist(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<WhitelistRequest>,
) -> Result<impl IntoResponse, SpinError> {
    let entry = state
        .campaign_service
        .add_to_whitelist(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
            &req.wallet_address,
            req.spins_allowed,
        )
        .await?;
    Ok(Json(entry))
}

/// `DELETE /admin/campaigns/:id/whitelist/:wallet`: Revoke a wallet.
///
/// # Errors
///
/// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
#[utoipa::path(
    delete,
    path = "/api/v1/admin/campaigns/{id}/whitelist/{wallet}",
    tag = "Admin",
    summary = "Remove a whitelist entry",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
        ("wallet" = String, Path, description = "Wallet address"),
    ),
    responses(
        (status = 200, description = "Removal result", body = WhitelistRemovalResponse),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn remove_from_whitelist(
    State(state): State<AppState>,
    Path((id, wallet)): Path<(uuid::Uuid, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SpinError> {
    let removed = state
        .campaign_service
        .remove_from_whitelist(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
            &wallet,
        )
        .await?;
    Ok(Json(WhitelistRemovalResponse { removed }))
}

/// `POST /admin/campaigns/:id/inventory`: Stock scarce NFT units.
///
/// # Errors
///
/// Returns [`SpinError::InvalidRequest`] for an empty batch or an `nft_id`
/// no prize of the campaign references.
#[utoipa::path(
    post,
    path = "/api/v1/admin/campaigns/{id}/inventory",
    tag = "Admin",
    summary = "Add prize inventory",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = InventoryRequest,
    responses(
        (status = 201, description = "Units added", body = InventoryResponse),
        (status = 400, description = "Invalid units", body = ErrorResponse),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn add_prize_inventory(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<InventoryRequest>,
) -> Result<impl IntoResponse, SpinError> {
    let data = state
        .campaign_service
        .add_prize_inventory(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
            req.units,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(InventoryResponse { data })))
}

/// `GET /admin/campaigns/:id/stats`: Spin, claim and inventory counters.
///
/// # Errors
///
/// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns/{id}/stats",
    tag = "Admin",
    summary = "Campaign statistics",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Campaign statistics", body = CampaignStats),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn get_campaign_stats(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SpinError> {
    let stats = state
        .campaign_service
        .get_campaign_stats(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
        )
        .await?;
    Ok(Json(stats))
}

/// `GET /admin/campaigns/:id/failed-spins`: Spins needing reconciliation.
///
/// # Errors
///
/// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns/{id}/failed-spins",
    tag = "Admin",
    summary = "List failed spins",
    description = "Returns `failed` spins and spins stuck in `claiming`, newest first.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Failed spins", body = FailedSpinsResponse),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn list_failed_spins(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SpinError> {
    let data = state
        .campaign_service
        .list_failed_spins(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
        )
        .await?;
    Ok(Json(FailedSpinsResponse { data }))
}

/// `GET /admin/campaigns/:id/stale-reservations`: Units reserved but
/// never claimed.
///
/// # Errors
///
/// Returns [`SpinError::Unauthorized`] or [`SpinError::CampaignNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns/{id}/stale-reservations",
    tag = "Admin",
    summary = "List stale reservations",
    description = "Returns units reserved longer ago than `older_than_secs` and still unclaimed. Reservations are never released automatically.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
        StaleQuery,
    ),
    responses(
        (status = 200, description = "Stale reservations", body = InventoryResponse),
        (status = 403, description = "Not an operator", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn list_stale_reservations(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<StaleQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SpinError> {
    let data = state
        .campaign_service
        .list_stale_reservations(
            header_str(&headers, OPERATOR_HEADER),
            CampaignId::from_uuid(id),
            query.older_than(),
        )
        .await?;
    Ok(Json(InventoryResponse { data }))
}

/// Operator routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/campaigns", post(create_campaign))
        .route("/admin/campaigns/{id}", put(update_campaign))
        .route("/admin/campaigns/{id}/active", post(set_campaign_active))
        .route("/admin/campaigns/{id}/whitelist", put(add_to_whitelist))
        .route(
            "/admin/campaigns/{id}/whitelist/{wallet}",
            delete(remove_from_whitelist),
        )
        .route("/admin/campaigns/{id}/inventory", post(add_prize_inventory))
        .route("/admin/campaigns/{id}/stats", get(get_campaign_stats))
        .route("/admin/campaigns/{id}/failed-spins", get(list_failed_spins))
        .route(
            "/admin/campaigns/{id}/stale-reservations",
            get(list_stale_reservations),
        )
}
