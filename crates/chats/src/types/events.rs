//! Store events broadcast after every mutation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::entities::{Conversation, Message, User};

/// Default buffer size of the event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Main chat event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// Message was appended to a conversation
    MessageSent {
        conversation_id: String,
        message: Message,
    },

    /// Conversation summary row was created
    ConversationCreated { conversation: Conversation },

    /// User was created on demand
    UserCreated { user: User },

    /// User was assigned to a group
    MemberAdded {
        group_id: String,
        user_id: String,
        previous_group_id: Option<String>,
    },

    /// User left a group
    MemberRemoved { group_id: String, user_id: String },
}

impl ChatEvent {
    /// Get the conversation ID associated with this event
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            ChatEvent::MessageSent {
                conversation_id, ..
            } => Some(conversation_id),
            ChatEvent::ConversationCreated { conversation } => Some(&conversation.id),
            ChatEvent::UserCreated { .. }
            | ChatEvent::MemberAdded { .. }
            | ChatEvent::MemberRemoved { .. } => None,
        }
    }

    /// Get the group ID associated with this event
    pub fn group_id(&self) -> Option<&str> {
        match self {
            ChatEvent::MemberAdded { group_id, .. } | ChatEvent::MemberRemoved { group_id, .. } => {
                Some(group_id)
            }
            _ => None,
        }
    }

    /// Get event type name for logging
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ChatEvent::MessageSent { .. } => "message_sent",
            ChatEvent::ConversationCreated { .. } => "conversation_created",
            ChatEvent::UserCreated { .. } => "user_created",
            ChatEvent::MemberAdded { .. } => "member_added",
            ChatEvent::MemberRemoved { .. } => "member_removed",
        }
    }
}

/// Fan-out of [`ChatEvent`]s to any number of listeners.
///
/// Emitting never blocks and never fails; listeners that fall behind see
/// `RecvError::Lagged` on their side.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChatEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ChatEvent) {
        let kind = event.event_type_name();
        trace!(
            kind,
            conversation_id = event.conversation_id(),
            group_id = event.group_id(),
            "emitting event"
        );
        match self.sender.send(event) {
            Ok(listeners) => trace!(kind, listeners, "event emitted"),
            Err(_) => trace!(kind, "event dropped, no listeners"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_added() -> ChatEvent {
        ChatEvent::MemberAdded {
            group_id: "g1".to_string(),
            user_id: "u1".to_string(),
            previous_group_id: Some("g0".to_string()),
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = member_added();
        assert_eq!(event.group_id(), Some("g1"));
        assert_eq!(event.conversation_id(), None);
        assert_eq!(event.event_type_name(), "member_added");

        let message = Message::new("c1", "u1", "hi");
        let event = ChatEvent::MessageSent {
            conversation_id: "c1".to_string(),
            message,
        };
        assert_eq!(event.conversation_id(), Some("c1"));
        assert_eq!(event.group_id(), None);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(member_added()).unwrap();
        assert_eq!(json["type"], "MemberAdded");
        assert_eq!(json["data"]["group_id"], "g1");
        assert_eq!(json["data"]["previous_group_id"], "g0");
    }

    #[tokio::test]
    async fn test_bus_delivers_to_every_listener() {
        let bus = EventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(member_added());

        assert_eq!(first.recv().await.unwrap(), member_added());
        assert_eq!(second.recv().await.unwrap(), member_added());
    }

    #[test]
    fn test_emit_without_listeners_is_harmless() {
        let bus = EventBus::new(0);
        bus.emit(member_added());
    }
}
