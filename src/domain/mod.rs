//! Domain layer: campaign model, prize selection, and event system.
//!
//! This module contains the server-side domain model: campaigns and their
//! weighted prize lists, whitelist entries, scarce inventory units, spin
//! history, the probability selector, result tamper evidence, and the
//! event bus for broadcasting state changes.

pub mod campaign;
pub mod event_bus;
pub mod history;
pub mod ids;
pub mod inventory;
pub mod result_hash;
pub mod selector;
pub mod spin_event;
pub mod whitelist;

pub use campaign::{Campaign, CampaignDraft, PrizeDefinition, PrizeType, SpinBudget};
pub use event_bus::EventBus;
pub use history::{PrizeOutcome, SpinHistory, SpinStatus};
pub use ids::{CampaignId, InventoryId, SpinHistoryId};
pub use inventory::{InventoryStatus, NewInventoryUnit, PrizeInventoryItem};
pub use result_hash::ResultSigner;
pub use selector::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use spin_event::SpinEvent;
pub use whitelist::WhitelistEntry;
