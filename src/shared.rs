use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced through the bot's public API
///
/// Delivery outcomes are deliberately NOT errors: `send_message` reports
/// "room not deliverable" as `Ok(false)` so callers can branch on the result
/// without error handling. Everything here is a genuine fault.
#[derive(Error, Debug)]
pub enum BotError {
    /// The server rejected the configured credentials. Construction fails
    /// rather than continuing with an unauthenticated session.
    #[error("authentication failed for {0}")]
    Auth(String),

    /// A room alias could not be resolved to a room id
    #[error("could not resolve alias {alias}")]
    AliasResolution { alias: String },

    /// Any other transport-level fault
    #[error(transparent)]
    Transport(#[from] TransportError),
}
