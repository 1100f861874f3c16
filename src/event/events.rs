use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A message posted to a room
///
/// Events represent facts that already happened on the server. They are
/// transient: dispatched once and never persisted. `content` carries the raw
/// payload as delivered by the transport so handlers can match on fields
/// beyond the plain text body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub event_id: String,
    pub room_id: String,
    pub sender: String,
    pub body: String,
    pub content: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl MessageEvent {
    /// Builds a plain-text message event with a generated id
    pub fn text(
        room_id: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        Self {
            event_id: format!("${}", uuid::Uuid::new_v4()),
            room_id: room_id.into(),
            sender: sender.into(),
            content: json!({ "msgtype": "m.text", "body": body }),
            body,
            timestamp: Utc::now(),
        }
    }
}

/// Events delivered by the transport's listener stream
///
/// Invites and room messages arrive interleaved on a single serial stream;
/// the delivery loop routes them to the invite acceptor or the dispatcher.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The bot was invited to a room it is not yet a member of
    Invite { room_id: String, inviter: String },

    /// A message was posted to a room
    Message {
        room_id: String,
        event: MessageEvent,
    },
}

impl TransportEvent {
    /// Room this event belongs to
    pub fn room_id(&self) -> &str {
        match self {
            TransportEvent::Invite { room_id, .. } => room_id,
            TransportEvent::Message { room_id, .. } => room_id,
        }
    }

    /// Human-readable event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            TransportEvent::Invite { .. } => "invite",
            TransportEvent::Message { .. } => "message",
        }
    }
}
