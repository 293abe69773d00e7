//! In-memory data access layer for the chat store.
//!
//! Each repository owns one slice of state and publishes a new snapshot
//! whenever it changes.

pub mod conversation_repository;
pub mod group_repository;
pub mod message_repository;
pub mod user_repository;

// Re-export all repositories
pub use conversation_repository::{ConversationRepository, SummaryUpdate};
pub use group_repository::GroupRepository;
pub use message_repository::MessageRepository;
pub use user_repository::UserRepository;
