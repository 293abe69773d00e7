//! Internal utilities for the chat store.
//!
//! Access rules shared by the services.

pub mod permissions;

// Re-export utilities
pub use permissions::*;
