use serde::{Deserialize, Serialize};

/// A chat room the bot can read from and post to
///
/// The id is the canonical room identifier assigned by the server; the alias
/// is an optional human-readable name that resolves to the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub alias: Option<String>,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}
