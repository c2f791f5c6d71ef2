//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod campaign;
pub mod claim;
pub mod system;

use axum::Router;
use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::app_state::AppState;
use crate::error::SpinError;

/// Header carrying the caller's wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Header carrying the operator's wallet address on admin routes.
pub const OPERATOR_HEADER: &str = "x-operator-address";

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(campaign::routes())
        .merge(claim::routes())
        .merge(admin::routes())
}

/// Returns a header as trimmed, non-empty text.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolves the caller's wallet from the `x-wallet-address` header, falling
/// back to a value taken from the query or body.
///
/// # Errors
///
/// Returns [`SpinError::InvalidRequest`] if neither source names a wallet.
fn resolve_wallet(headers: &HeaderMap, fallback: Option<String>) -> Result<String, SpinError> {
    header_str(headers, WALLET_HEADER)
        .map(str::to_string)
        .or(fallback)
        .ok_or_else(|| SpinError::InvalidRequest("wallet address is required".to_string()))
}

/// Parses an optional JSON body. An empty body yields `T::default()`.
///
/// # Errors
///
/// Returns [`SpinError::InvalidRequest`] for a body that is not valid JSON
/// for `T`.
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, SpinError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| SpinError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::api::dto::SpinRequest;
    use axum::http::HeaderValue;

    #[test]
    fn header_wins_over_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(WALLET_HEADER, HeaderValue::from_static(" 0xheader "));
        let Ok(wallet) = resolve_wallet(&headers, Some("0xbody".to_string())) else {
            panic!("wallet should resolve");
        };
        assert_eq!(wallet, "0xheader");
    }

    #[test]
    fn missing_wallet_is_invalid_request() {
        let result = resolve_wallet(&HeaderMap::new(), None);
        assert!(matches!(result, Err(SpinError::InvalidRequest(_))));
    }

    #[test]
    fn empty_body_defaults() {
        let Ok(req) = optional_json::<SpinRequest>(&Bytes::from_static(b"  ")) else {
            panic!("empty body should default");
        };
        assert!(req.wallet_address.is_none());

        let bad = optional_json::<SpinRequest>(&Bytes::from_static(b"{nope"));
        assert!(matches!(bad, Err(SpinError::InvalidRequest(_))));
    }
}
