//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }

    /// Serializes the message, falling back to an empty string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands carried in the payload of a `command` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Follow campaigns. Use `["*"]` for all campaigns.
    Subscribe {
        /// Campaign IDs to follow.
        campaign_ids: Vec<String>,
        /// Optional event type filter, e.g. `["prize_claimed"]`.
        #[serde(default)]
        event_types: Vec<String>,
    },
    /// Stop following campaigns. `"*"` clears the wildcard.
    Unsubscribe {
        /// Campaign IDs to drop.
        campaign_ids: Vec<String>,
    },
    /// Liveness check.
    Ping,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_parses_with_defaults() {
        let json = r#"{"command":"subscribe","campaign_ids":["*"]}"#;
        let Ok(cmd) = serde_json::from_str::<WsCommand>(json) else {
            panic!("parse failed");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                campaign_ids: vec!["*".to_string()],
                event_types: Vec::new(),
            }
        );
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let json = r#"{"type":"command","payload":{"command":"ping"}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(json) else {
            panic!("parse failed");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        assert!(msg.id.is_empty());
    }
}
