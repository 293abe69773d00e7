//! Business logic services for the chat store.
//!
//! Services coordinate between repositories, enforce the membership and
//! access rules, and broadcast a [`crate::types::ChatEvent`] for every
//! mutation.

pub mod access_service;
pub mod membership_service;
pub mod message_service;
pub mod search_service;

pub use access_service::AccessService;
pub use membership_service::MembershipService;
pub use message_service::MessageService;
pub use search_service::SearchService;
