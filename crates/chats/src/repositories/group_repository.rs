//! Repository for groups and user memberships.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::entities::{Group, User};
use crate::observable::{Observable, Subscription};
use crate::types::{GroupId, UserId};

/// Fixed group list plus the single-valued user to group mapping.
///
/// A user missing from the mapping is unassigned. Derived streams (members
/// of a group, group of a user) are created on first subscription, refreshed
/// by [`GroupRepository::refresh`] and dropped once nobody subscribes.
pub struct GroupRepository {
    default_group_id: GroupId,
    groups: Observable<Vec<Group>>,
    memberships: RwLock<HashMap<UserId, GroupId>>,
    member_streams: RwLock<HashMap<GroupId, Observable<Vec<User>>>>,
    group_id_streams: RwLock<HashMap<UserId, Observable<GroupId>>>,
}

impl GroupRepository {
    pub fn new(
        default_group_id: impl Into<GroupId>,
        groups: Vec<Group>,
        memberships: HashMap<UserId, GroupId>,
    ) -> Self {
        Self {
            default_group_id: default_group_id.into(),
            groups: Observable::new(groups),
            memberships: RwLock::new(memberships),
            member_streams: RwLock::new(HashMap::new()),
            group_id_streams: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_group_id(&self) -> &str {
        &self.default_group_id
    }

    pub fn groups(&self) -> Vec<Group> {
        self.groups.snapshot()
    }

    pub fn find_group(&self, group_id: &str) -> Option<Group> {
        self.groups
            .read(|groups| groups.iter().find(|group| group.id == group_id).cloned())
    }

    pub fn subscribe_groups(&self) -> Subscription<Vec<Group>> {
        self.groups.subscribe()
    }

    /// The user's real membership, if any.
    pub async fn membership(&self, user_id: &str) -> Option<GroupId> {
        self.memberships.read().await.get(user_id).cloned()
    }

    /// The user's membership, falling back to the default group.
    pub async fn effective_group_id(&self, user_id: &str) -> GroupId {
        self.membership(user_id)
            .await
            .unwrap_or_else(|| self.default_group_id.clone())
    }

    pub async fn memberships(&self) -> HashMap<UserId, GroupId> {
        self.memberships.read().await.clone()
    }

    /// Point the user at `group_id`, returning the group it replaced.
    pub async fn assign(&self, user_id: &str, group_id: &str) -> Option<GroupId> {
        let mut memberships = self.memberships.write().await;
        memberships.insert(user_id.to_string(), group_id.to_string())
    }

    /// Unassign the user, but only from the group it is currently in.
    pub async fn unassign_from(&self, user_id: &str, group_id: &str) -> bool {
        let mut memberships = self.memberships.write().await;
        if memberships.get(user_id).map(String::as_str) != Some(group_id) {
            return false;
        }
        memberships.remove(user_id);
        true
    }

    /// Members of `group_id`, in the order of `users`.
    pub async fn members_of(&self, group_id: &str, users: &[User]) -> Vec<User> {
        let memberships = self.memberships.read().await;
        Self::collect_members(&memberships, group_id, users)
    }

    pub async fn subscribe_members(&self, group_id: &str, users: &[User]) -> Subscription<Vec<User>> {
        let members = self.members_of(group_id, users).await;
        let mut streams = self.member_streams.write().await;
        streams.retain(|_, stream| stream.subscriber_count() > 0);
        streams
            .entry(group_id.to_string())
            .or_insert_with(|| Observable::new(members))
            .subscribe()
    }

    pub async fn subscribe_group_id(&self, user_id: &str) -> Subscription<GroupId> {
        let group_id = self.effective_group_id(user_id).await;
        let mut streams = self.group_id_streams.write().await;
        streams.retain(|_, stream| stream.subscriber_count() > 0);
        streams
            .entry(user_id.to_string())
            .or_insert_with(|| Observable::new(group_id))
            .subscribe()
    }

    /// Recompute every observed derived stream; only streams whose value
    /// changed notify their subscribers. Unobserved streams are discarded.
    pub async fn refresh(&self, users: &[User]) {
        let memberships = self.memberships.read().await;

        let mut member_streams = self.member_streams.write().await;
        member_streams.retain(|_, stream| stream.subscriber_count() > 0);
        for (group_id, stream) in member_streams.iter() {
            let members = Self::collect_members(&memberships, group_id, users);
            if stream.publish_if_changed(members) {
                debug!(group_id = %group_id, "group members changed");
            }
        }

        let mut group_id_streams = self.group_id_streams.write().await;
        group_id_streams.retain(|_, stream| stream.subscriber_count() > 0);
        for (user_id, stream) in group_id_streams.iter() {
            let group_id = memberships
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| self.default_group_id.clone());
            stream.publish_if_changed(group_id);
        }
    }

    fn collect_members(
        memberships: &HashMap<UserId, GroupId>,
        group_id: &str,
        users: &[User],
    ) -> Vec<User> {
        users
            .iter()
            .filter(|user| memberships.get(&user.id).map(String::as_str) == Some(group_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![
            User::new("u1", "Leonardo"),
            User::new("u2", "Raul"),
            User::new("u3", "Cynthia"),
        ]
    }

    fn repository() -> GroupRepository {
        let memberships = HashMap::from([
            ("u1".to_string(), "g0".to_string()),
            ("u2".to_string(), "g0".to_string()),
            ("u3".to_string(), "g1".to_string()),
        ]);
        GroupRepository::new(
            "g0",
            vec![Group::new("g0", "WTC Connect"), Group::new("g1", "Comercial")],
            memberships,
        )
    }

    #[tokio::test]
    async fn test_membership_and_fallback() {
        let repository = repository();

        assert_eq!(repository.membership("u3").await.as_deref(), Some("g1"));
        assert_eq!(repository.membership("stranger").await, None);
        assert_eq!(repository.effective_group_id("stranger").await, "g0");
        assert_eq!(repository.find_group("g1").unwrap().name, "Comercial");
        assert!(repository.find_group("g9").is_none());
    }

    #[tokio::test]
    async fn test_assign_overwrites() {
        let repository = repository();

        assert_eq!(repository.assign("u1", "g1").await.as_deref(), Some("g0"));
        assert_eq!(repository.assign("new", "g1").await, None);
        assert_eq!(repository.membership("u1").await.as_deref(), Some("g1"));
    }

    #[tokio::test]
    async fn test_unassign_requires_current_group() {
        let repository = repository();

        assert!(!repository.unassign_from("u3", "g0").await);
        assert_eq!(repository.membership("u3").await.as_deref(), Some("g1"));

        assert!(repository.unassign_from("u3", "g1").await);
        assert_eq!(repository.membership("u3").await, None);
        assert!(!repository.unassign_from("u3", "g1").await);
    }

    #[tokio::test]
    async fn test_member_stream_refreshes_only_on_change() {
        let repository = repository();
        let users = users();

        let mut members = repository.subscribe_members("g0", &users).await;
        let initial = members.next().await.unwrap();
        assert_eq!(
            initial.iter().map(|user| user.id.as_str()).collect::<Vec<_>>(),
            vec!["u1", "u2"]
        );

        repository.assign("u3", "g1").await;
        repository.refresh(&users).await;
        assert!(!members.has_pending());

        repository.assign("u3", "g0").await;
        repository.refresh(&users).await;
        assert_eq!(members.next().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_group_id_stream_follows_membership() {
        let repository = repository();
        let users = users();

        let mut group_id = repository.subscribe_group_id("u3").await;
        assert_eq!(group_id.next().await.as_deref(), Some("g1"));

        repository.unassign_from("u3", "g1").await;
        repository.refresh(&users).await;
        assert_eq!(group_id.next().await.as_deref(), Some("g0"));
    }

    #[tokio::test]
    async fn test_dropped_streams_are_discarded() {
        let repository = repository();
        let users = users();

        for index in 0..100 {
            drop(repository.subscribe_group_id(&format!("user-{index}")).await);
            drop(repository.subscribe_members(&format!("group-{index}"), &users).await);
        }
        let mut kept = repository.subscribe_members("g1", &users).await;

        repository.assign("u1", "g1").await;
        repository.refresh(&users).await;

        assert!(repository.group_id_streams.read().await.is_empty());
        let member_streams = repository.member_streams.read().await;
        assert_eq!(member_streams.len(), 1);
        assert!(member_streams.contains_key("g1"));
        drop(member_streams);
        assert_eq!(kept.next().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_subscribing_discards_abandoned_streams() {
        let repository = repository();
        let users = users();

        drop(repository.subscribe_group_id("u1").await);
        drop(repository.subscribe_members("g0", &users).await);
        let _group_id = repository.subscribe_group_id("u2").await;
        let _members = repository.subscribe_members("g1", &users).await;

        let group_id_streams = repository.group_id_streams.read().await;
        assert_eq!(group_id_streams.keys().collect::<Vec<_>>(), vec!["u2"]);
        let member_streams = repository.member_streams.read().await;
        assert_eq!(member_streams.keys().collect::<Vec<_>>(), vec!["g1"]);
    }
}
