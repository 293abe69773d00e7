//! Repository for conversation summaries.

use chrono::{DateTime, Utc};

use crate::entities::{Conversation, User};
use crate::observable::{Observable, Subscription};

/// Outcome of recording a message against the summary list.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryUpdate {
    /// An existing row now shows the message
    Updated,
    /// A new row was appended
    Created(Conversation),
    /// No row exists and none was created
    Untracked,
}

/// Conversation summaries in insertion order
pub struct ConversationRepository {
    conversations: Observable<Vec<Conversation>>,
}

impl ConversationRepository {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Observable::new(conversations),
        }
    }

    pub fn all(&self) -> Vec<Conversation> {
        self.conversations.snapshot()
    }

    pub fn find(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations.read(|conversations| {
            conversations
                .iter()
                .find(|conversation| conversation.id == conversation_id)
                .cloned()
        })
    }

    pub fn subscribe(&self) -> Subscription<Vec<Conversation>> {
        self.conversations.subscribe()
    }

    /// Reflect a sent message in the summary list.
    ///
    /// An existing row is updated in place. Otherwise, when `peer` is given,
    /// a new row is appended for it. Both cases publish a new snapshot.
    pub fn record_message(
        &self,
        conversation_id: &str,
        content: &str,
        at: DateTime<Utc>,
        peer: Option<User>,
    ) -> SummaryUpdate {
        let mut outcome = SummaryUpdate::Untracked;

        self.conversations.modify_if(|conversations| {
            if let Some(existing) = conversations
                .iter_mut()
                .find(|conversation| conversation.id == conversation_id)
            {
                existing.record_message(content, at);
                outcome = SummaryUpdate::Updated;
                return true;
            }

            match peer {
                Some(peer) => {
                    let created = Conversation::new(conversation_id, peer, content, at);
                    conversations.push(created.clone());
                    outcome = SummaryUpdate::Created(created);
                    true
                }
                None => false,
            }
        });

        outcome
    }
}
