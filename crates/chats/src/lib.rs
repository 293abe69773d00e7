//! # WTC Connect Chats Crate
//!
//! In-memory store for the chats, groups and contacts of WTC Connect. It
//! holds users, groups, the user to group membership, conversation
//! summaries and messages, decides who may open a conversation, and pushes
//! a fresh snapshot to every observer whenever the store changes.
//!
//! ## Architecture
//!
//! - **Entities**: Domain models (User, Group, Conversation, Message)
//! - **Repositories**: In-memory state, one observable per stream
//! - **Services**: Membership, messaging, search and access rules
//! - **Store**: The [`ChatStore`] facade owning all of the above
//! - **Types**: Errors, events and identifiers
//!
//! ## Usage
//!
//! ```rust
//! use wtc_chats::{ChatStore, SessionUser};
//! use wtc_config::SeedConfig;
//!
//! # tokio_test::block_on(async {
//! let session = SessionUser::client("me");
//! let store = ChatStore::seeded(&SeedConfig::default(), &session);
//!
//! let mut messages = store.subscribe_messages("c1").await;
//! store.send_message("c1", "Claro!", &session.id).await?;
//!
//! let snapshot = messages.next().await.unwrap_or_default();
//! assert_eq!(snapshot.last().map(|m| m.content.as_str()), Some("Claro!"));
//! # Ok::<(), wtc_chats::ChatError>(())
//! # }).unwrap();
//! ```

pub mod entities;
pub mod observable;
pub mod repositories;
pub mod services;
pub mod store;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use entities::{Conversation, ConversationTarget, Group, Message, User};
pub use observable::{Observable, Subscription};
pub use services::{AccessService, MembershipService, MessageService, SearchService};
pub use store::ChatStore;
pub use types::{
    ChatError, ChatEvent, ChatResult, ConversationId, EventBus, GroupId, MessageId, SessionUser,
    UserId, UserRole,
};
