//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams [`crate::domain::SpinEvent`]s
//! for the campaigns a client subscribes to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
