//! Chat message model
//!
//! Messages are produced by the conversation layer and consumed read-only by
//! the render pipeline. `text` is append-only while `is_streaming` is true.

use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Who {
    /// Assistant-generated message
    System,
    /// End-user message
    User,
    /// Machine-generated follow-up suggestion
    Suggestion,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable message identifier
    pub id: String,
    /// Message text, append-only while streaming
    pub text: String,
    /// Message author
    pub who: Who,
    /// Hidden messages are kept in history but never rendered
    #[serde(default)]
    pub hidden: bool,
    /// Whether the generation producing this message is still running
    #[serde(default)]
    pub is_streaming: bool,
    /// Isolated messages do not contribute to conversation context
    #[serde(default)]
    pub isolated: bool,
}

impl Message {
    /// Create a visible, non-streaming message
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, who: Who) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            who,
            hidden: false,
            is_streaming: false,
            isolated: false,
        }
    }

    /// Mark as still streaming
    #[inline]
    #[must_use]
    pub fn streaming(mut self) -> Self {
        self.is_streaming = true;
        self
    }

    /// Mark as hidden
    #[inline]
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}
