// Public API - what other modules can use
pub use client::{ChatTransport, SendAck, Session, TransportError};
pub use memory::InMemoryTransport;

// Internal modules
mod client;
mod memory;
