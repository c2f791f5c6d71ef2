//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1` except `/health`. Public
//! routes identify the caller by the `x-wallet-address` header, admin
//! routes by `x-operator-address`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "spin-gateway",
        description = "Promotional spin campaigns with scarce NFT prizes"
    ),
    paths(
        handlers::system::health_handler,
        handlers::campaign::list_campaigns,
        handlers::campaign::get_campaign,
        handlers::campaign::check_eligibility,
        handlers::campaign::execute_spin,
        handlers::campaign::spin_history,
        handlers::claim::claim_prize,
        handlers::admin::create_campaign,
        handlers::admin::update_campaign,
        handlers::admin::set_campaign_active,
        handlers::admin::add_to_whitelist,
        handlers::admin::remove_from_whitelist,
        handlers::admin::add_prize_inventory,
        handlers::admin::get_campaign_stats,
        handlers::admin::list_failed_spins,
        handlers::admin::list_stale_reservations,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Campaigns", description = "Campaign catalogue, eligibility and spins"),
        (name = "Claims", description = "NFT prize claims"),
        (name = "Admin", description = "Operator-only campaign management"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
