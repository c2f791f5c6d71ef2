//! Prize claim handler.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::{optional_json, resolve_wallet};
use crate::api::dto::ClaimRequest;
use crate::app_state::AppState;
use crate::domain::SpinHistoryId;
use crate::error::{ErrorResponse, SpinError};
use crate::service::ClaimResult;

/// `POST /spins/:id/claim`: Transfer a reserved NFT to its winner.
///
/// Repeating a completed claim returns the original transaction hash
/// without transferring again.
///
/// # Errors
///
/// Returns [`SpinError::Claim`] for unknown, foreign, unclaimable or
/// in-flight spins and [`SpinError::TransferFailure`] when the transfer
/// fails. A failed claim can be retried.
#[utoipa::path(
    post,
    path = "/api/v1/spins/{id}/claim",
    tag = "Claims",
    summary = "Claim an NFT prize",
    params(
        ("id" = uuid::Uuid, Path, description = "Spin history UUID"),
    ),
    request_body(content = ClaimRequest, description = "Optional; may be empty when the header is set"),
    responses(
        (status = 200, description = "Claim result", body = ClaimResult),
        (status = 403, description = "Spin belongs to another wallet", body = ErrorResponse),
        (status = 404, description = "Spin not found", body = ErrorResponse),
        (status = 409, description = "Nothing to claim or claim in progress", body = ErrorResponse),
        (status = 502, description = "Transfer failed", body = ErrorResponse),
    )
)]
pub async fn claim_prize(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, SpinError> {
    let req: ClaimRequest = optional_json(&body)?;
    let wallet = resolve_wallet(&headers, req.wallet_address)?;
    let result = state
        .claim_service
        .claim_prize(SpinHistoryId::from_uuid(id), &wallet)
        .await?;
    Ok(Json(result))
}

/// Claim routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/spins/{id}/claim", post(claim_prize))
}
