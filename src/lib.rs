//! # spin-gateway
//!
//! REST API and WebSocket gateway for promotional spin campaigns.
//!
//! Wallets spend a limited number of spins on a campaign wheel and win
//! either a text message or a scarce NFT. Each NFT unit is reserved for
//! exactly one spin and later transferred to the winner through an
//! external transfer capability. Spin budgets and inventory are enforced
//! atomically by the store so concurrent spins never overspend.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── CampaignService / SpinService / ClaimService (service/)
//!     ├── EventBus, Selector, ResultSigner (domain/)
//!     │
//!     ├── CampaignStore (persistence/)
//!     │     ├── InMemoryStore
//!     │     └── PostgresStore
//!     │
//!     └── NftTransfer (transfer.rs)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod transfer;
pub mod ws;
