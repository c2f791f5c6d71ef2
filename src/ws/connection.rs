//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! applying subscription commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{CampaignId, SpinEvent};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and replies to each.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(socket: WebSocket, mut event_rx: broadcast::Receiver<SpinEvent>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if ws_tx.send(Message::text(reply.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if subs.matches(&event) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&event).unwrap_or_default(),
                            );
                            if ws_tx.send(Message::text(msg.to_json())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits client-supplied ids into parsed campaign ids and a wildcard flag.
/// Unparseable ids are returned separately.
fn parse_campaign_ids(raw: &[String]) -> (Vec<CampaignId>, bool, Vec<String>) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    let mut rejected = Vec::new();
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(uuid) = s.parse::<uuid::Uuid>() {
            ids.push(CampaignId::from_uuid(uuid));
        } else {
            rejected.push(s.clone());
        }
    }
    (ids, wildcard, rejected)
}

/// Applies one client message and builds the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command message");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    let payload = match command {
        WsCommand::Subscribe {
            campaign_ids,
            event_types,
        } => {
            let (ids, wildcard, rejected) = parse_campaign_ids(&campaign_ids);
            subs.subscribe(&ids, wildcard);
            subs.set_event_types(event_types);
            serde_json::json!({
                "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "rejected": rejected,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { campaign_ids } => {
            let (ids, wildcard, rejected) = parse_campaign_ids(&campaign_ids);
            subs.unsubscribe(&ids, wildcard);
            serde_json::json!({
                "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "rejected": rejected,
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Ping => serde_json::json!({ "pong": true }),
    };
    WsMessage::new(msg.id, WsMessageType::Response, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn command(payload: serde_json::Value) -> String {
        serde_json::json!({ "id": "req-1", "type": "command", "payload": payload }).to_string()
    }

    #[test]
    fn subscribe_then_events_match() {
        let mut subs = SubscriptionManager::new();
        let id = CampaignId::new();
        let reply = handle_text_message(
            &command(serde_json::json!({
                "command": "subscribe",
                "campaign_ids": [id.to_string(), "not-a-uuid"],
            })),
            &mut subs,
        );
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.id, "req-1");
        assert_eq!(reply.payload.get("count"), Some(&serde_json::json!(1)));
        assert_eq!(
            reply.payload.get("rejected"),
            Some(&serde_json::json!(["not-a-uuid"]))
        );

        let event = SpinEvent::CampaignUpdated {
            campaign_id: id,
            active: false,
            timestamp: Utc::now(),
        };
        assert!(subs.matches(&event));
    }

    #[test]
    fn garbage_is_reported() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message("{not json", &mut subs);
        assert_eq!(reply.msg_type, WsMessageType::Error);

        let reply = handle_text_message(
            &command(serde_json::json!({ "command": "spin" })),
            &mut subs,
        );
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload.get("code"), Some(&serde_json::json!(404)));
    }

    #[test]
    fn ping_gets_pong() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(&command(serde_json::json!({ "command": "ping" })), &mut subs);
        assert_eq!(reply.payload, serde_json::json!({ "pong": true }));
    }
}
