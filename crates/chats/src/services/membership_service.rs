//! Membership service for assigning users to groups.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::entities::{Group, User};
use crate::observable::Subscription;
use crate::repositories::{GroupRepository, UserRepository};
use crate::types::{ChatError, ChatEvent, ChatResult, EventBus, GroupId};

/// Service for managing group memberships
pub struct MembershipService {
    users: Arc<UserRepository>,
    groups: Arc<GroupRepository>,
    events: EventBus,
}

impl MembershipService {
    /// Create a new membership service instance
    pub fn new(users: Arc<UserRepository>, groups: Arc<GroupRepository>, events: EventBus) -> Self {
        Self {
            users,
            groups,
            events,
        }
    }

    /// Assign the user owning `email` to `group_id`.
    ///
    /// An unknown address gets a brand new user. Any previous membership is
    /// overwritten and neither the group nor the address is checked, so the
    /// call always succeeds.
    pub async fn add_user_to_group_by_email(&self, group_id: &str, email: &str) -> ChatResult<User> {
        let (user, created) = self.users.find_or_create_by_email(email).await;
        if created {
            info!(user_id = %user.id, email, "created user from email");
            self.events.emit(ChatEvent::UserCreated { user: user.clone() });
        }

        let previous_group_id = self.groups.assign(&user.id, group_id).await;
        self.refresh_streams().await;

        info!(user_id = %user.id, group_id, ?previous_group_id, "user added to group");
        self.events.emit(ChatEvent::MemberAdded {
            group_id: group_id.to_string(),
            user_id: user.id.clone(),
            previous_group_id,
        });

        Ok(user)
    }

    /// Remove a user from the group it currently belongs to.
    ///
    /// Fails with [`ChatError::NotAMember`] and changes nothing when the
    /// user's membership is anything other than `group_id`.
    pub async fn remove_user_from_group(&self, group_id: &str, user_id: &str) -> ChatResult<()> {
        if !self.groups.unassign_from(user_id, group_id).await {
            warn!(user_id, group_id, "refusing to remove user from a group it is not in");
            return Err(ChatError::not_a_member(user_id, group_id));
        }

        self.refresh_streams().await;

        info!(user_id, group_id, "user removed from group");
        self.events.emit(ChatEvent::MemberRemoved {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    /// The user's real membership; `None` when unassigned.
    pub async fn user_group_id(&self, user_id: &str) -> Option<GroupId> {
        self.groups.membership(user_id).await
    }

    /// The user's membership, or the default group when unassigned.
    pub async fn effective_group_id(&self, user_id: &str) -> GroupId {
        self.groups.effective_group_id(user_id).await
    }

    pub fn default_group_id(&self) -> &str {
        self.groups.default_group_id()
    }

    /// Stream of [`MembershipService::effective_group_id`].
    pub async fn subscribe_user_group_id(&self, user_id: &str) -> Subscription<GroupId> {
        self.groups.subscribe_group_id(user_id).await
    }

    pub fn groups(&self) -> Vec<Group> {
        self.groups.groups()
    }

    pub fn subscribe_groups(&self) -> Subscription<Vec<Group>> {
        self.groups.subscribe_groups()
    }

    pub async fn group_members(&self, group_id: &str) -> Vec<User> {
        self.groups.members_of(group_id, &self.users.all()).await
    }

    pub async fn subscribe_group_members(&self, group_id: &str) -> Subscription<Vec<User>> {
        debug!(group_id, "subscribing to group members");
        self.groups.subscribe_members(group_id, &self.users.all()).await
    }

    async fn refresh_streams(&self) {
        self.groups.refresh(&self.users.all()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn service() -> MembershipService {
        let users = Arc::new(UserRepository::new(vec![
            User::new("u1", "Leonardo").with_email("leo@example.com"),
            User::new("u2", "Raul").with_email("raul@example.com"),
        ]));
        let groups = Arc::new(GroupRepository::new(
            "g0",
            vec![Group::new("g0", "WTC Connect"), Group::new("g1", "Comercial")],
            HashMap::from([
                ("u1".to_string(), "g0".to_string()),
                ("u2".to_string(), "g0".to_string()),
            ]),
        ));
        MembershipService::new(users, groups, EventBus::default())
    }

    #[tokio::test]
    async fn test_add_existing_user_moves_membership() {
        let service = service();
        let mut events = service.events.subscribe();

        let user = service
            .add_user_to_group_by_email("g1", "RAUL@example.com")
            .await
            .unwrap();
        assert_eq!(user.id, "u2");
        assert_eq!(service.user_group_id("u2").await.as_deref(), Some("g1"));

        assert_eq!(
            events.recv().await.unwrap(),
            ChatEvent::MemberAdded {
                group_id: "g1".to_string(),
                user_id: "u2".to_string(),
                previous_group_id: Some("g0".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_add_unknown_email_creates_user() {
        let service = service();
        let mut events = service.events.subscribe();

        let user = service
            .add_user_to_group_by_email("g9", "Nova.Pessoa@wtc.com")
            .await
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("Nova.Pessoa@wtc.com"));
        assert_eq!(user.name, "Nova Pessoa");
        assert_eq!(service.user_group_id(&user.id).await.as_deref(), Some("g9"));

        assert!(matches!(events.recv().await.unwrap(), ChatEvent::UserCreated { .. }));
        assert!(matches!(events.recv().await.unwrap(), ChatEvent::MemberAdded { .. }));
    }

    #[tokio::test]
    async fn test_add_accepts_blank_input() {
        let service = service();

        let first = service.add_user_to_group_by_email("g0", "").await.unwrap();
        assert_eq!(first.email.as_deref(), Some(""));
        assert_eq!(first.name, "");
        assert_eq!(service.user_group_id(&first.id).await.as_deref(), Some("g0"));

        let again = service.add_user_to_group_by_email("g1", "").await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(service.users.all().len(), 3);

        let user = service
            .add_user_to_group_by_email("", "leo@example.com")
            .await
            .unwrap();
        assert_eq!(service.user_group_id(&user.id).await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_remove_user_from_group() {
        let service = service();

        let error = service.remove_user_from_group("g1", "u1").await.unwrap_err();
        assert_eq!(error, ChatError::not_a_member("u1", "g1"));
        assert_eq!(service.user_group_id("u1").await.as_deref(), Some("g0"));

        service.remove_user_from_group("g0", "u1").await.unwrap();
        assert_eq!(service.user_group_id("u1").await, None);
        assert_eq!(service.effective_group_id("u1").await, "g0");
    }

    #[tokio::test]
    async fn test_member_stream_sees_add_and_remove() {
        let service = service();
        let mut members = service.subscribe_group_members("g1").await;
        assert_eq!(members.next().await, Some(Vec::new()));

        service
            .add_user_to_group_by_email("g1", "leo@example.com")
            .await
            .unwrap();
        let snapshot = members.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "u1");

        service.remove_user_from_group("g1", "u1").await.unwrap();
        assert_eq!(members.next().await, Some(Vec::new()));
    }
}
