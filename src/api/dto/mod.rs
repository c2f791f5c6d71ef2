//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain types that already carry `Serialize`/`ToSchema` are returned
//! as-is; the DTOs here only wrap lists and shape request bodies.

pub mod admin_dto;
pub mod campaign_dto;
pub mod common_dto;

pub use admin_dto::*;
pub use campaign_dto::*;
pub use common_dto::*;
