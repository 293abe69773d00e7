//! Search over users and conversation summaries.

use std::sync::Arc;

use tracing::debug;

use crate::entities::{Conversation, User};
use crate::repositories::{GroupRepository, UserRepository};

pub struct SearchService {
    users: Arc<UserRepository>,
    groups: Arc<GroupRepository>,
}

impl SearchService {
    pub fn new(users: Arc<UserRepository>, groups: Arc<GroupRepository>) -> Self {
        Self { users, groups }
    }

    /// Case-insensitive substring search on name or email.
    ///
    /// An empty (or blank) query matches everyone. `within_group_id` keeps
    /// only users whose real membership is that group.
    pub async fn search_users(&self, query: &str, within_group_id: Option<&str>) -> Vec<User> {
        let needle = query.trim().to_lowercase();
        let memberships = match within_group_id {
            Some(_) => Some(self.groups.memberships().await),
            None => None,
        };

        let results: Vec<User> = self
            .users
            .all()
            .into_iter()
            .filter(|user| user.matches_query(&needle))
            .filter(|user| match (within_group_id, &memberships) {
                (Some(group_id), Some(memberships)) => {
                    memberships.get(&user.id).map(String::as_str) == Some(group_id)
                }
                _ => true,
            })
            .collect();

        debug!(query, ?within_group_id, matches = results.len(), "user search");
        results
    }

    /// Narrow a conversation list by peer name, ignoring case.
    pub fn filter_conversations(conversations: &[Conversation], query: &str) -> Vec<Conversation> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return conversations.to_vec();
        }

        conversations
            .iter()
            .filter(|conversation| conversation.peer_user.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}
