//! Error types for the chat store.

use thiserror::Error;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("User {user_id} is not a member of group {group_id}")]
    NotAMember { user_id: String, group_id: String },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },
}

impl ChatError {
    /// Create a membership precondition error
    pub fn not_a_member(user_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self::NotAMember {
            user_id: user_id.into(),
            group_id: group_id.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }
}
