// Chat bot adapter library
//
// Logs into a chat server through a pluggable transport, tracks joined
// rooms, auto-accepts invites, and dispatches room events to registered
// handlers in order with per-handler failure isolation.

pub mod bot;
pub mod config;
pub mod event;
pub mod room;
pub mod shared;
pub mod transport;

// Re-export commonly used types for easier access
pub use bot::Bot;
pub use config::{BotConfig, SenderFilter};
pub use event::{
    DispatchOutcome, Dispatcher, EventHandler, FnHandler, HandlerError, HandlerRegistry,
    MessageEvent, NoOpHandler, TransportEvent,
};
pub use room::{Room, RoomRegistry};
pub use shared::BotError;
pub use transport::{ChatTransport, InMemoryTransport, SendAck, Session, TransportError};
