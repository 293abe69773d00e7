use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::group::GROUP_CONVERSATION_PREFIX;
use super::user::{User, GROUP_PEER_PREFIX};
use crate::types::{ConversationId, GroupId, UserId};

/// Summary row of a conversation as shown in the conversation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    /// The other party; a group placeholder for broadcast conversations
    pub peer_user: User,
    pub last_message: String,
    pub last_timestamp: DateTime<Utc>,
    pub unread_count: u32,
}

impl Conversation {
    pub fn new(
        id: impl Into<ConversationId>,
        peer_user: User,
        last_message: impl Into<String>,
        last_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            peer_user,
            last_message: last_message.into(),
            last_timestamp,
            unread_count: 0,
        }
    }

    pub fn with_unread(mut self, unread_count: u32) -> Self {
        self.unread_count = unread_count;
        self
    }

    pub fn is_group(&self) -> bool {
        self.id.starts_with(GROUP_CONVERSATION_PREFIX) || self.peer_user.is_group_placeholder()
    }

    /// Reflect a message the local user just sent.
    pub fn record_message(&mut self, content: &str, at: DateTime<Utc>) {
        self.last_message = content.to_string();
        self.last_timestamp = at;
        self.unread_count = 0;
    }
}

/// What a conversation id (plus an optional peer id) points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationTarget {
    /// 1:1 chat with a real user
    Direct { peer_user_id: UserId },
    /// Broadcast chat of a whole group
    Group { group_id: GroupId },
}

impl ConversationTarget {
    /// Group id encoded in a `group_<id>` conversation id.
    pub fn group_id_of(conversation_id: &str) -> Option<&str> {
        conversation_id
            .strip_prefix(GROUP_CONVERSATION_PREFIX)
            .filter(|group_id| !group_id.is_empty())
    }

    /// Classify a conversation from its id and the peer id the caller knows.
    ///
    /// A `group:<id>` peer or a `group_<id>` conversation id denotes a group,
    /// the peer's form taking precedence. Returns `None` for a direct chat
    /// whose peer is not known yet.
    pub fn resolve(conversation_id: &str, peer_user_id: Option<&str>) -> Option<Self> {
        let peer_group = peer_user_id
            .and_then(|peer| peer.strip_prefix(GROUP_PEER_PREFIX))
            .filter(|group_id| !group_id.is_empty());

        if let Some(group_id) = peer_group.or_else(|| Self::group_id_of(conversation_id)) {
            return Some(Self::Group {
                group_id: group_id.to_string(),
            });
        }

        peer_user_id.map(|peer| Self::Direct {
            peer_user_id: peer.to_string(),
        })
    }
}
