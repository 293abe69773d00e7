//! Message service for sending and reading messages.

use std::sync::Arc;

use tracing::{debug, info};

use crate::entities::{Conversation, ConversationTarget, Message, User};
use crate::observable::Subscription;
use crate::repositories::{ConversationRepository, GroupRepository, MessageRepository, SummaryUpdate};
use crate::types::{ChatEvent, ChatResult, EventBus};

/// Service for managing message operations
pub struct MessageService {
    conversations: Arc<ConversationRepository>,
    messages: Arc<MessageRepository>,
    groups: Arc<GroupRepository>,
    events: EventBus,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(
        conversations: Arc<ConversationRepository>,
        messages: Arc<MessageRepository>,
        groups: Arc<GroupRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            conversations,
            messages,
            groups,
            events,
        }
    }

    /// Append a message and reflect it in the conversation list.
    ///
    /// A first message into `group_<id>` of a known group also creates that
    /// group's summary row. Messages into any other unknown conversation are
    /// stored without a summary.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        sender_id: &str,
    ) -> ChatResult<Message> {
        let message = Message::new(conversation_id, sender_id, content);
        let length = self.messages.append(message.clone()).await;

        let placeholder = ConversationTarget::group_id_of(conversation_id)
            .and_then(|group_id| self.groups.find_group(group_id))
            .map(|group| User::group_placeholder(&group));

        match self.conversations.record_message(
            conversation_id,
            &message.content,
            message.timestamp,
            placeholder,
        ) {
            SummaryUpdate::Updated => {}
            SummaryUpdate::Created(conversation) => {
                info!(conversation_id, "created group conversation on first message");
                self.events.emit(ChatEvent::ConversationCreated { conversation });
            }
            SummaryUpdate::Untracked => {
                debug!(conversation_id, "message stored without a conversation summary");
            }
        }

        info!(conversation_id, sender_id, message_id = %message.id, length, "message sent");
        self.events.emit(ChatEvent::MessageSent {
            conversation_id: conversation_id.to_string(),
            message: message.clone(),
        });

        Ok(message)
    }

    pub async fn messages(&self, conversation_id: &str) -> Vec<Message> {
        self.messages.list(conversation_id).await
    }

    pub async fn subscribe_messages(&self, conversation_id: &str) -> Subscription<Vec<Message>> {
        self.messages.subscribe(conversation_id).await
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.conversations.all()
    }

    pub fn find_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations.find(conversation_id)
    }

    pub fn subscribe_conversations(&self) -> Subscription<Vec<Conversation>> {
        self.conversations.subscribe()
    }
}
