use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use super::client::{ChatTransport, SendAck, Session, TransportError};
use crate::event::{MessageEvent, TransportEvent};
use crate::room::Room;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// In-memory implementation of [`ChatTransport`] for development and testing
///
/// Models a tiny server: user accounts, a room directory with aliases, and
/// the set of rooms the bot has joined. Tests seed state through the helper
/// methods and drive the bot by pushing events onto the stream; outbound
/// messages are recorded for assertions.
pub struct InMemoryTransport {
    accounts: RwLock<HashMap<String, String>>,
    directory: RwLock<HashMap<String, Room>>,
    aliases: RwLock<HashMap<String, String>>,
    joined: RwLock<Vec<String>>,
    sent: Mutex<Vec<(String, String)>>,
    server: String,
    events_tx: broadcast::Sender<TransportEvent>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            directory: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            joined: RwLock::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            server: "inmemory.test".to_string(),
            events_tx,
        }
    }

    /// Registers a user account the transport will accept at login
    pub async fn add_account(&self, username: &str, password: &str) {
        self.accounts
            .write()
            .await
            .insert(username.to_string(), password.to_string());
    }

    /// Creates a room in the server directory without joining it
    pub async fn open_room(&self, room: Room) {
        if let Some(alias) = &room.alias {
            self.aliases
                .write()
                .await
                .insert(alias.clone(), room.id.clone());
        }
        self.directory.write().await.insert(room.id.clone(), room);
    }

    /// Creates a room and marks the bot as already a member of it
    pub async fn open_joined_room(&self, room: Room) {
        let room_id = room.id.clone();
        self.open_room(room).await;
        self.joined.write().await.push(room_id);
    }

    /// Maps an alias onto an existing room id
    pub async fn set_alias(&self, alias: &str, room_id: &str) {
        self.aliases
            .write()
            .await
            .insert(alias.to_string(), room_id.to_string());
    }

    /// Pushes an invite onto the event stream
    pub fn push_invite(&self, room_id: &str, inviter: &str) {
        let _ = self.events_tx.send(TransportEvent::Invite {
            room_id: room_id.to_string(),
            inviter: inviter.to_string(),
        });
    }

    /// Pushes a room message onto the event stream
    pub fn push_message(&self, room_id: &str, sender: &str, body: &str) {
        let _ = self.events_tx.send(TransportEvent::Message {
            room_id: room_id.to_string(),
            event: MessageEvent::text(room_id, sender, body),
        });
    }

    /// Messages sent through the transport so far, as (room_id, text) pairs
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn clear_sent_messages(&self) {
        self.sent.lock().await.clear();
    }

    async fn is_joined(&self, room_id: &str) -> bool {
        self.joined.read().await.iter().any(|id| id == room_id)
    }
}

#[async_trait]
impl ChatTransport for InMemoryTransport {
    async fn login(&self, username: &str, password: &str) -> Result<Session, TransportError> {
        let accounts = self.accounts.read().await;
        match accounts.get(username) {
            Some(stored) if stored == password => {
                info!(username = %username, "Login accepted");
                Ok(Session {
                    user_id: format!("@{}:{}", username, self.server),
                    server: self.server.clone(),
                })
            }
            _ => {
                debug!(username = %username, "Login rejected");
                Err(TransportError::Auth {
                    username: username.to_string(),
                })
            }
        }
    }

    async fn current_rooms(&self) -> Result<Vec<Room>, TransportError> {
        let directory = self.directory.read().await;
        let joined = self.joined.read().await;
        Ok(joined
            .iter()
            .filter_map(|id| directory.get(id).cloned())
            .collect())
    }

    async fn join_room(&self, room_id: &str) -> Result<Room, TransportError> {
        let room = self
            .directory
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| TransportError::UnknownRoom(room_id.to_string()))?;

        let mut joined = self.joined.write().await;
        if !joined.iter().any(|id| id == room_id) {
            joined.push(room_id.to_string());
        }
        info!(room_id = %room_id, "Joined room");
        Ok(room)
    }

    async fn resolve_alias(&self, alias: &str) -> Result<String, TransportError> {
        self.aliases
            .read()
            .await
            .get(alias)
            .cloned()
            .ok_or_else(|| TransportError::UnknownAlias(alias.to_string()))
    }

    async fn room_exists(&self, room_id: &str) -> Result<bool, TransportError> {
        Ok(self.directory.read().await.contains_key(room_id))
    }

    async fn send_text(&self, room_id: &str, text: &str) -> Result<SendAck, TransportError> {
        if !self.directory.read().await.contains_key(room_id) {
            return Err(TransportError::UnknownRoom(room_id.to_string()));
        }
        if !self.is_joined(room_id).await {
            return Err(TransportError::UnknownRoom(room_id.to_string()));
        }

        self.sent
            .lock()
            .await
            .push((room_id.to_string(), text.to_string()));
        debug!(room_id = %room_id, "Message sent");
        Ok(SendAck {
            event_id: format!("${}", uuid::Uuid::new_v4()),
        })
    }

    fn events(&self) -> broadcast::Receiver<TransportEvent> {
        self.events_tx.subscribe()
    }
}
