use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error};

use super::events::MessageEvent;
use super::handler::HandlerError;
use super::registry::HandlerRegistry;
use crate::config::SenderFilter;
use crate::room::Room;

/// Summary of one dispatch sweep
///
/// Dispatch is side-effect driven; the counts exist for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Handlers whose predicate matched and whose action was invoked
    pub invoked: usize,
    /// Subset of invoked handlers whose action failed or timed out
    pub failures: usize,
}

/// Routes a room event through the registered handlers
///
/// Stateless per event. For each event: filter out the bot's own messages,
/// then sweep the handler list in registration order, invoking every handler
/// whose predicate matches. A failing handler is logged and skipped; it never
/// stops the sweep or crashes the delivery task. Handlers run sequentially on
/// the delivery task, so a slow handler delays subsequent events — bound it
/// with `handler_timeout` if that matters.
pub struct Dispatcher {
    self_id: String,
    // `@username`, the legacy prefix pattern for SenderFilter::Prefix
    self_prefix: String,
    sender_filter: SenderFilter,
    handlers: Arc<HandlerRegistry>,
    handler_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        self_id: impl Into<String>,
        username: &str,
        handlers: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            self_id: self_id.into(),
            self_prefix: format!("@{}", username),
            sender_filter: SenderFilter::default(),
            handlers,
            handler_timeout: None,
        }
    }

    pub fn with_sender_filter(mut self, filter: SenderFilter) -> Self {
        self.sender_filter = filter;
        self
    }

    /// Bound each handler invocation; a timeout counts as a handler failure
    pub fn with_handler_timeout(mut self, limit: Duration) -> Self {
        self.handler_timeout = Some(limit);
        self
    }

    fn is_self_event(&self, event: &MessageEvent) -> bool {
        match self.sender_filter {
            SenderFilter::Exact => event.sender == self.self_id,
            // Legacy behavior: any sender starting with `@username` is
            // treated as the bot itself, including unrelated users like
            // `@botanist:server`
            SenderFilter::Prefix => event.sender.starts_with(&self.self_prefix),
        }
    }

    /// Runs the handler sweep for one event
    pub async fn dispatch(&self, room: &Room, event: &MessageEvent) -> DispatchOutcome {
        if self.is_self_event(event) {
            debug!(
                room_id = %event.room_id,
                sender = %event.sender,
                "Discarding self-originated event"
            );
            return DispatchOutcome::default();
        }

        let handlers = self.handlers.snapshot().await;
        debug!(
            room_id = %event.room_id,
            event_id = %event.event_id,
            handler_count = handlers.len(),
            "Dispatching event"
        );

        let mut outcome = DispatchOutcome::default();
        for handler in handlers {
            if !handler.test(event) {
                continue;
            }
            outcome.invoked += 1;

            let result = match self.handler_timeout {
                Some(limit) => match timeout(limit, handler.handle(room, event)).await {
                    Ok(result) => result,
                    Err(_) => Err(HandlerError::Timeout),
                },
                None => handler.handle(room, event).await,
            };

            if let Err(e) = result {
                outcome.failures += 1;
                error!(
                    handler = handler.name(),
                    room_id = %event.room_id,
                    event_id = %event.event_id,
                    error = %e,
                    "Handler failed, continuing sweep"
                );
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler::EventHandler;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn room() -> Room {
        Room::new("!a:server")
    }

    struct RecordingHandler {
        name: &'static str,
        matches: bool,
        fails: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RecordingHandler {
        fn new(
            name: &'static str,
            matches: bool,
            fails: bool,
            log: Arc<Mutex<Vec<&'static str>>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                matches,
                fails,
                log,
            })
        }
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        fn test(&self, _event: &MessageEvent) -> bool {
            self.matches
        }

        async fn handle(&self, _room: &Room, _event: &MessageEvent) -> Result<(), HandlerError> {
            self.log.lock().unwrap().push(self.name);
            if self.fails {
                Err(HandlerError::failed("simulated failure"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn matching_handlers_run_in_registration_order() {
        let registry = Arc::new(HandlerRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        registry
            .add(RecordingHandler::new("first", true, false, log.clone()))
            .await;
        registry
            .add(RecordingHandler::new("skipped", false, false, log.clone()))
            .await;
        registry
            .add(RecordingHandler::new("second", true, false, log.clone()))
            .await;

        let dispatcher = Dispatcher::new("@bot:server", "bot", registry);
        let event = MessageEvent::text("!a:server", "@alice:server", "hi");

        let outcome = dispatcher.dispatch(&room(), &event).await;

        assert_eq!(outcome, DispatchOutcome { invoked: 2, failures: 0 });
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_the_sweep() {
        let registry = Arc::new(HandlerRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        registry
            .add(RecordingHandler::new("broken", true, true, log.clone()))
            .await;
        registry
            .add(RecordingHandler::new("after", true, false, log.clone()))
            .await;

        let dispatcher = Dispatcher::new("@bot:server", "bot", registry);
        let event = MessageEvent::text("!a:server", "@alice:server", "hi");

        let outcome = dispatcher.dispatch(&room(), &event).await;

        assert_eq!(outcome, DispatchOutcome { invoked: 2, failures: 1 });
        assert_eq!(*log.lock().unwrap(), vec!["broken", "after"]);
    }

    #[tokio::test]
    async fn duplicate_handler_is_invoked_twice() {
        let registry = Arc::new(HandlerRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let handler = RecordingHandler::new("dup", true, false, log.clone());
        registry.add(handler.clone()).await;
        registry.add(handler).await;

        let dispatcher = Dispatcher::new("@bot:server", "bot", registry);
        let event = MessageEvent::text("!a:server", "@alice:server", "hi");

        let outcome = dispatcher.dispatch(&room(), &event).await;

        assert_eq!(outcome.invoked, 2);
        assert_eq!(*log.lock().unwrap(), vec!["dup", "dup"]);
    }

    #[rstest]
    #[case(SenderFilter::Exact, "@bot:server", 0)]
    #[case(SenderFilter::Exact, "@botanist:server", 1)]
    #[case(SenderFilter::Prefix, "@bot:server", 0)]
    // Prefix matches `@username`, so it over-matches users and servers
    // sharing the bot's name as a prefix
    #[case(SenderFilter::Prefix, "@bot:server_2", 0)]
    #[case(SenderFilter::Prefix, "@botanist:server", 0)]
    #[case(SenderFilter::Prefix, "@alice:server", 1)]
    #[tokio::test]
    async fn sender_filter_policies(
        #[case] filter: SenderFilter,
        #[case] sender: &str,
        #[case] expected_invocations: usize,
    ) {
        let registry = Arc::new(HandlerRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        registry
            .add(RecordingHandler::new("h", true, false, log.clone()))
            .await;

        let dispatcher =
            Dispatcher::new("@bot:server", "bot", registry).with_sender_filter(filter);
        let event = MessageEvent::text("!a:server", sender, "hi");

        let outcome = dispatcher.dispatch(&room(), &event).await;
        assert_eq!(outcome.invoked, expected_invocations);
    }

    struct SlowHandler {
        completed: Arc<AtomicU32>,
    }

    #[async_trait]
    impl EventHandler for SlowHandler {
        fn test(&self, _event: &MessageEvent) -> bool {
            true
        }

        async fn handle(&self, _room: &Room, _event: &MessageEvent) -> Result<(), HandlerError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            self.completed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "SlowHandler"
        }
    }

    #[tokio::test]
    async fn timed_out_handler_counts_as_failure_and_sweep_continues() {
        let registry = Arc::new(HandlerRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(AtomicU32::new(0));

        registry
            .add(Arc::new(SlowHandler {
                completed: completed.clone(),
            }) as Arc<dyn EventHandler>)
            .await;
        registry
            .add(RecordingHandler::new("after", true, false, log.clone()))
            .await;

        let dispatcher = Dispatcher::new("@bot:server", "bot", registry)
            .with_handler_timeout(Duration::from_millis(20));
        let event = MessageEvent::text("!a:server", "@alice:server", "hi");

        let outcome = dispatcher.dispatch(&room(), &event).await;

        assert_eq!(outcome, DispatchOutcome { invoked: 2, failures: 1 });
        assert_eq!(completed.load(Ordering::Relaxed), 0);
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }
}
