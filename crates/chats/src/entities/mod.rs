//! Domain entities for the chat store.
//!
//! Plain data objects for users, groups, conversation summaries and
//! messages. They carry no storage or notification concerns.

pub mod conversation;
pub mod group;
pub mod message;
pub mod user;

// Re-export all entity types
pub use conversation::{Conversation, ConversationTarget};
pub use group::{Group, GROUP_CONVERSATION_PREFIX};
pub use message::Message;
pub use user::{User, GROUP_PEER_PREFIX};
