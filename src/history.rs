//! Conversation history.

use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole};

/// Ordered, append-only record of one chat session.
///
/// Messages are only ever pushed; nothing is reordered or removed while the
/// session lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        tracing::trace!(
            role = ?message.role,
            index = self.messages.len(),
            has_tool_calls = message.tool_calls.is_some(),
            "History append"
        );
        self.messages.push(message);
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been said yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Count of messages with the given role.
    #[must_use]
    pub fn count_role(&self, role: MessageRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

impl From<Vec<Message>> for ConversationHistory {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}
