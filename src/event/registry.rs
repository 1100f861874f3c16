use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::handler::EventHandler;

/// Ordered list of registered handlers
///
/// Append-only: there is no removal and no deduplication. Registering the
/// same handler twice yields two invocations per matching event. The sweep
/// always runs in registration order; `snapshot` hands the dispatcher a
/// stable copy so registration can happen concurrently with dispatch.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Appends a handler to the end of the sweep order
    pub async fn add(&self, handler: Arc<dyn EventHandler>) {
        info!(handler = handler.name(), "Registering event handler");
        self.handlers.write().await.push(handler);
    }

    /// Current handlers in registration order
    pub async fn snapshot(&self) -> Vec<Arc<dyn EventHandler>> {
        self.handlers.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handlers.read().await.is_empty()
    }
}
