use std::time::Duration;

use serde::Deserialize;

/// Policy for recognizing the bot's own messages in the event stream
///
/// The legacy behavior treated any sender starting with `@username` as
/// self-originated, which swallows events from unrelated users sharing the
/// bot's name as a prefix (`@botanist:server` when the bot is `bot`).
/// `Exact` compares against the bot's full user id and is the default; opt
/// into `Prefix` only if you depend on the old behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderFilter {
    #[default]
    Exact,
    Prefix,
}

/// Startup configuration for a [`Bot`](crate::Bot)
///
/// `rooms` lists room ids to operate in; when `None`, the bot discovers its
/// rooms from the transport's current membership at login. `accept_invites`
/// controls whether invite events are honored at all (default true).
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    #[serde(default)]
    pub rooms: Option<Vec<String>>,
    #[serde(default = "default_accept_invites")]
    pub accept_invites: bool,
    #[serde(default)]
    pub sender_filter: SenderFilter,
    /// Upper bound on a single handler invocation. `None` (the default)
    /// means handlers run unbounded on the delivery task; a timeout is
    /// treated as a non-fatal handler failure.
    #[serde(skip)]
    pub handler_timeout: Option<Duration>,
}

fn default_accept_invites() -> bool {
    true
}

impl BotConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            server: server.into(),
            rooms: None,
            accept_invites: true,
            sender_filter: SenderFilter::default(),
            handler_timeout: None,
        }
    }

    /// Operate only in the given rooms instead of discovering membership
    pub fn with_rooms(mut self, rooms: Vec<String>) -> Self {
        self.rooms = Some(rooms);
        self
    }

    pub fn with_accept_invites(mut self, accept: bool) -> Self {
        self.accept_invites = accept;
        self
    }

    pub fn with_sender_filter(mut self, filter: SenderFilter) -> Self {
        self.sender_filter = filter;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }
}
