use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::Group;
use crate::types::UserId;

/// Prefix of the placeholder peer id standing in for a whole group.
pub const GROUP_PEER_PREFIX: &str = "group:";

/// Represents a contact known to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Contact email, matched case-insensitively
    pub email: Option<String>,
    /// Avatar reference
    pub avatar_url: Option<String>,
}

impl User {
    /// Create a new user instance
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            avatar_url: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Create a user for an address nobody registered yet.
    ///
    /// The id is a fresh UUID, the email is kept exactly as given and the
    /// display name is derived from the local part.
    pub fn from_email(email: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: Self::display_name_from_email(email),
            email: Some(email.to_string()),
            avatar_url: None,
        }
    }

    /// `john.doe@example.com` becomes `John doe`.
    pub fn display_name_from_email(email: &str) -> String {
        let local = email.split('@').next().unwrap_or_default().replace('.', " ");
        let mut chars = local.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Placeholder peer shown as the counterpart of a group conversation.
    pub fn group_placeholder(group: &Group) -> Self {
        Self::new(format!("{GROUP_PEER_PREFIX}{}", group.id), group.name.clone())
    }

    pub fn is_group_placeholder(&self) -> bool {
        self.id.starts_with(GROUP_PEER_PREFIX)
    }

    /// Check whether the email matches, ignoring case
    pub fn has_email(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|own| own.to_lowercase() == email.to_lowercase())
    }

    /// Case-insensitive substring match on name or email.
    ///
    /// `needle` must already be lower-cased; an empty needle matches.
    pub fn matches_query(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(needle)
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(needle))
    }
}
