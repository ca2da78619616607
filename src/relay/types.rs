//! Request and response bodies of the relay's HTTP surface.

use serde::{Deserialize, Serialize};

/// Reply text for a missing or empty message.
pub const EMPTY_MESSAGE_REPLY: &str = "Please send a message.";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    /// The message when present and non-empty.
    pub fn prompt(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// Response body of `POST /chat`. `reply` is always set, errors included.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}
