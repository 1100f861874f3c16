use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BotConfig;
use crate::event::{Dispatcher, EventHandler, HandlerRegistry, TransportEvent};
use crate::room::{Room, RoomRegistry};
use crate::shared::BotError;
use crate::transport::{ChatTransport, Session, TransportError};

/// Chat bot facade: login, room bookkeeping, and event dispatch
///
/// Construction authenticates against the transport and seeds the room
/// registry, either from the configured room list or from the server's
/// current membership. Register handlers with [`add_handler`](Bot::add_handler),
/// then call [`start_polling`](Bot::start_polling) to spawn the delivery task
/// that routes invites and room messages.
pub struct Bot {
    session: Session,
    transport: Arc<dyn ChatTransport>,
    rooms: Arc<RoomRegistry>,
    handlers: Arc<HandlerRegistry>,
    dispatcher: Arc<Dispatcher>,
    accept_invites: bool,
}

impl Bot {
    /// Authenticates and builds the bot
    ///
    /// Fails with [`BotError::Auth`] when the server rejects the credentials;
    /// there is no unauthenticated fallback. Room ids listed in the config
    /// are joined so the registry only ever holds rooms the bot is actually
    /// a member of.
    pub async fn login(
        config: BotConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self, BotError> {
        let session = transport
            .login(&config.username, &config.password)
            .await
            .map_err(|e| match e {
                TransportError::Auth { username } => BotError::Auth(username),
                other => BotError::Transport(other),
            })?;

        let rooms = Arc::new(RoomRegistry::new());
        match &config.rooms {
            Some(ids) => {
                for id in ids {
                    let room = transport.join_room(id).await?;
                    rooms.add(room).await;
                }
            }
            None => {
                for room in transport.current_rooms().await? {
                    rooms.add(room).await;
                }
            }
        }

        info!(
            user_id = %session.user_id,
            total_rooms = rooms.len().await,
            accept_invites = config.accept_invites,
            "Bot logged in"
        );

        let handlers = Arc::new(HandlerRegistry::new());
        let mut dispatcher =
            Dispatcher::new(session.user_id.clone(), &config.username, handlers.clone())
                .with_sender_filter(config.sender_filter);
        if let Some(limit) = config.handler_timeout {
            dispatcher = dispatcher.with_handler_timeout(limit);
        }

        Ok(Self {
            session,
            transport,
            rooms,
            handlers,
            dispatcher: Arc::new(dispatcher),
            accept_invites: config.accept_invites,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Rooms currently tracked, in insertion order
    pub async fn rooms(&self) -> Vec<Room> {
        self.rooms.list().await
    }

    /// Appends a handler to the end of the dispatch order
    ///
    /// Safe to call after polling has started; the next event sees the
    /// updated list.
    pub async fn add_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.add(handler).await;
    }

    /// Sends a text message
    ///
    /// With neither `room_id` nor `room_alias`, broadcasts to every tracked
    /// room and returns `Ok(true)` (vacuously true on an empty registry).
    /// An alias is resolved through the transport first; resolution failure
    /// propagates as [`BotError::AliasResolution`]. A targeted send requires
    /// the server to know the room AND the registry to track it; when either
    /// check fails the message is not sent and the result is `Ok(false)`.
    #[instrument(skip(self, text))]
    pub async fn send_message(
        &self,
        text: &str,
        room_id: Option<&str>,
        room_alias: Option<&str>,
    ) -> Result<bool, BotError> {
        let target = match (room_id, room_alias) {
            (Some(id), _) => Some(id.to_string()),
            (None, Some(alias)) => {
                let id = self.transport.resolve_alias(alias).await.map_err(|e| {
                    debug!(alias = %alias, error = %e, "Alias resolution failed");
                    BotError::AliasResolution {
                        alias: alias.to_string(),
                    }
                })?;
                Some(id)
            }
            (None, None) => None,
        };

        match target {
            None => {
                let rooms = self.rooms.list().await;
                debug!(room_count = rooms.len(), "Broadcasting message");
                for room in rooms {
                    self.transport.send_text(&room.id, text).await?;
                }
                Ok(true)
            }
            Some(id) => {
                let known = self.transport.room_exists(&id).await?;
                if !known || !self.rooms.contains(&id).await {
                    debug!(room_id = %id, known = known, "Room not deliverable");
                    return Ok(false);
                }
                self.transport.send_text(&id, text).await?;
                Ok(true)
            }
        }
    }

    /// Spawns the delivery task
    ///
    /// Exactly one task consumes the transport's event stream; handlers run
    /// on it sequentially, so a slow handler delays subsequent delivery. The
    /// task ends when the transport closes its stream.
    pub fn start_polling(&self) -> JoinHandle<()> {
        let mut receiver = self.transport.events();
        let transport = self.transport.clone();
        let rooms = self.rooms.clone();
        let dispatcher = self.dispatcher.clone();
        let accept_invites = self.accept_invites;

        info!(accept_invites = accept_invites, "Starting event delivery task");

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(TransportEvent::Invite { room_id, inviter }) => {
                        if !accept_invites {
                            debug!(room_id = %room_id, inviter = %inviter, "Ignoring invite");
                            continue;
                        }
                        Self::accept_invite(&transport, &rooms, &room_id, &inviter).await;
                    }
                    Ok(TransportEvent::Message { room_id, event }) => {
                        let Some(room) = rooms.get(&room_id).await else {
                            debug!(room_id = %room_id, "Message for untracked room, ignoring");
                            continue;
                        };
                        dispatcher.dispatch(&room, &event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Event stream lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("Event delivery task stopped");
        })
    }

    /// Joins an invited room and registers it for dispatch
    async fn accept_invite(
        transport: &Arc<dyn ChatTransport>,
        rooms: &Arc<RoomRegistry>,
        room_id: &str,
        inviter: &str,
    ) {
        info!(room_id = %room_id, inviter = %inviter, "Accepting invite");
        match transport.join_room(room_id).await {
            Ok(room) => {
                rooms.add(room).await;
            }
            Err(e) => {
                error!(room_id = %room_id, error = %e, "Failed to join invited room");
            }
        }
    }
}
