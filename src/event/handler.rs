use async_trait::async_trait;
use thiserror::Error;

use super::events::MessageEvent;
use crate::room::Room;

/// Errors that can occur inside a handler's action
///
/// Handler failures are caught at the dispatcher boundary, logged, and never
/// stop the sweep of remaining handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler timed out")]
    Timeout,

    #[error("handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

/// A registered (predicate, action) pair
///
/// `test` decides whether the handler cares about an event; `handle` performs
/// the action, typically sending a reply through the bot. Handlers run in
/// registration order and every handler whose predicate matches is invoked,
/// not just the first.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Whether this handler wants the event
    fn test(&self, event: &MessageEvent) -> bool;

    /// React to the event. Failures are isolated per handler.
    async fn handle(&self, room: &Room, event: &MessageEvent) -> Result<(), HandlerError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Builds a handler from a pair of closures, sparing callers a trait impl
///
/// The action is synchronous; handlers needing to await should implement
/// [`EventHandler`] directly.
pub struct FnHandler {
    name: &'static str,
    predicate: Box<dyn Fn(&MessageEvent) -> bool + Send + Sync>,
    action: Box<dyn Fn(&Room, &MessageEvent) -> Result<(), HandlerError> + Send + Sync>,
}

impl FnHandler {
    pub fn new(
        name: &'static str,
        predicate: impl Fn(&MessageEvent) -> bool + Send + Sync + 'static,
        action: impl Fn(&Room, &MessageEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            predicate: Box::new(predicate),
            action: Box::new(action),
        }
    }
}

#[async_trait]
impl EventHandler for FnHandler {
    fn test(&self, event: &MessageEvent) -> bool {
        (self.predicate)(event)
    }

    async fn handle(&self, room: &Room, event: &MessageEvent) -> Result<(), HandlerError> {
        (self.action)(room, event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A handler that matches everything and does nothing, for tests
pub struct NoOpHandler;

#[async_trait]
impl EventHandler for NoOpHandler {
    fn test(&self, _event: &MessageEvent) -> bool {
        true
    }

    async fn handle(&self, _room: &Room, _event: &MessageEvent) -> Result<(), HandlerError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoOpHandler"
    }
}
