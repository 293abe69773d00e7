//! Shared types for the chat store.
//!
//! Error definitions, store events, identifier aliases and the session
//! identity handed over by the authentication service.

pub mod errors;
pub mod events;

pub use errors::{ChatError, ChatResult};
pub use events::{ChatEvent, EventBus};

use serde::{Deserialize, Serialize};
use wtc_config::{SessionConfig, SessionRole};

// Common type aliases
pub type UserId = String;
pub type GroupId = String;
pub type ConversationId = String;
pub type MessageId = String;

/// Role of the signed-in caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Client,
    /// Bypasses group membership checks.
    Operator,
}

impl From<SessionRole> for UserRole {
    fn from(role: SessionRole) -> Self {
        match role {
            SessionRole::Client => UserRole::Client,
            SessionRole::Operator => UserRole::Operator,
        }
    }
}

/// Identity of the caller as supplied by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Option<String>,
    pub role: UserRole,
}

impl SessionUser {
    pub fn client(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role: UserRole::Client,
        }
    }

    pub fn operator(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role: UserRole::Operator,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.role, UserRole::Operator)
    }
}

impl From<&SessionConfig> for SessionUser {
    fn from(config: &SessionConfig) -> Self {
        Self {
            id: config.user_id.clone(),
            email: config.email.clone(),
            role: config.role.into(),
        }
    }
}
