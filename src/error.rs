//! Gateway error types with HTTP status code mapping.
//!
//! [`SpinError`] is the central error type for the engine. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Lost races on the spin ledger or the prize inventory are never reported
//! as a distinct error: they surface as [`SpinError::Eligibility`] or as a
//! fallback outcome, exactly like the non-racing case.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CampaignId, SpinHistoryId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "not eligible: no spins remaining",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Local validation failures raised by the claim manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// No spin with the given ID exists.
    #[error("spin {0} not found")]
    NotFound(SpinHistoryId),

    /// The spin belongs to a different wallet.
    #[error("spin does not belong to this wallet")]
    NotOwner,

    /// The spin did not award a claimable NFT.
    #[error("nothing to claim for this spin")]
    NothingToClaim,

    /// Another claim for the same spin is currently in flight.
    #[error("a claim for this spin is already in progress")]
    InProgress,

    /// The stored result hash does not match the recorded outcome.
    #[error("spin result failed integrity check")]
    Tampered,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Validation/Config | 400 / 422                    |
/// | 2000–2999 | State/Not Found   | 404 / 403 / 409              |
/// | 3000–3999 | Server            | 500 Internal Server Error    |
/// | 4000–4999 | Authorization     | 403 Forbidden                |
/// | 5000–5999 | External          | 502 Bad Gateway              |
#[derive(Debug, thiserror::Error)]
pub enum SpinError {
    /// The wallet may not spin (inactive/ended campaign, not whitelisted,
    /// budget exhausted).
    #[error("not eligible: {0}")]
    Eligibility(String),

    /// The campaign is misconfigured (no prizes, probabilities off).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Campaign with the given ID was not found.
    #[error("campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// Claim validation failed.
    #[error("claim rejected: {0}")]
    Claim(#[from] ClaimError),

    /// The external NFT transfer capability failed.
    #[error("transfer failed: {0}")]
    TransferFailure(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Caller lacks operator privileges.
    #[error("wallet {0} is not an operator")]
    Unauthorized(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SpinError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Configuration(_) => 1002,
            Self::CampaignNotFound(_) => 2001,
            Self::Claim(ClaimError::NotFound(_)) => 2002,
            Self::Eligibility(_) => 2101,
            Self::Claim(_) => 2201,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Unauthorized(_) => 4001,
            Self::TransferFailure(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::CampaignNotFound(_) | Self::Claim(ClaimError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Claim(ClaimError::NotOwner) | Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Eligibility(_) | Self::Claim(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TransferFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for SpinError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for SpinError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn claim_not_found_maps_to_404() {
        let err = SpinError::from(ClaimError::NotFound(SpinHistoryId::new()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2002);
    }

    #[test]
    fn not_owner_maps_to_403() {
        let err = SpinError::Claim(ClaimError::NotOwner);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), 2201);
    }

    #[test]
    fn eligibility_is_conflict() {
        let err = SpinError::Eligibility("no spins remaining".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("no spins remaining"));
    }

    #[test]
    fn configuration_is_unprocessable() {
        let err = SpinError::Configuration("probabilities sum to 0.85".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), 1002);
    }

    #[test]
    fn into_response_carries_status() {
        let response = SpinError::TransferFailure("relay down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
