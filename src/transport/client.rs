use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::event::TransportEvent;
use crate::room::Room;

/// Transport-level faults
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("authentication rejected for {username}")]
    Auth { username: String },

    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("unknown alias: {0}")]
    UnknownAlias(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// An authenticated connection to the chat server
#[derive(Debug, Clone)]
pub struct Session {
    /// Fully-qualified user id assigned by the server, e.g. `@bot:server`
    pub user_id: String,
    pub server: String,
}

/// Server acknowledgement of a sent message
#[derive(Debug, Clone)]
pub struct SendAck {
    pub event_id: String,
}

/// The chat-protocol client this layer sits on top of
///
/// Connectivity, the sync loop, and membership persistence all live behind
/// this trait; the bot only consumes it. `events` hands out a receiver on the
/// transport's single listener stream, which delivers invites and room
/// messages serially.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Authenticates and establishes a session
    async fn login(&self, username: &str, password: &str) -> Result<Session, TransportError>;

    /// Rooms the logged-in user is currently a member of
    async fn current_rooms(&self) -> Result<Vec<Room>, TransportError>;

    /// Joins a room by id, returning the joined room
    async fn join_room(&self, room_id: &str) -> Result<Room, TransportError>;

    /// Resolves a room alias to its canonical room id
    async fn resolve_alias(&self, alias: &str) -> Result<String, TransportError>;

    /// Whether the server knows the room at all (member or not)
    async fn room_exists(&self, room_id: &str) -> Result<bool, TransportError>;

    /// Posts a text message to a room
    async fn send_text(&self, room_id: &str, text: &str) -> Result<SendAck, TransportError>;

    /// Subscribes to the transport's event stream
    fn events(&self) -> broadcast::Receiver<TransportEvent>;
}
