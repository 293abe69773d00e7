//! Repository for per-conversation message lists.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::entities::Message;
use crate::observable::{Observable, Subscription};
use crate::types::ConversationId;

/// One append-only message stream per conversation id
pub struct MessageRepository {
    streams: RwLock<HashMap<ConversationId, Observable<Vec<Message>>>>,
}

impl MessageRepository {
    pub fn new(messages: HashMap<ConversationId, Vec<Message>>) -> Self {
        let streams = messages
            .into_iter()
            .map(|(conversation_id, list)| (conversation_id, Observable::new(list)))
            .collect();

        Self {
            streams: RwLock::new(streams),
        }
    }

    /// Append a message, creating the conversation's stream when missing.
    /// Returns the new length of the list.
    pub async fn append(&self, message: Message) -> usize {
        let mut streams = self.streams.write().await;
        let stream = streams
            .entry(message.conversation_id.clone())
            .or_default();

        let mut length = 0;
        stream.modify(|list| {
            list.push(message);
            length = list.len();
        });
        length
    }

    pub async fn list(&self, conversation_id: &str) -> Vec<Message> {
        let streams = self.streams.read().await;
        streams
            .get(conversation_id)
            .map(Observable::snapshot)
            .unwrap_or_default()
    }

    /// Subscribe to a conversation; unknown ids get an empty stream.
    pub async fn subscribe(&self, conversation_id: &str) -> Subscription<Vec<Message>> {
        let mut streams = self.streams.write().await;
        streams
            .entry(conversation_id.to_string())
            .or_default()
            .subscribe()
    }
}
