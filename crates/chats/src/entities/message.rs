use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ConversationId, MessageId, UserId};

/// Represents a message within a conversation. Messages are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub delivered: bool,
}

impl Message {
    /// Create a delivered message stamped with the current time
    pub fn new(
        conversation_id: impl Into<ConversationId>,
        sender_id: impl Into<UserId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            delivered: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
