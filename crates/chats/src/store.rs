//! The chat store facade.
//!
//! [`ChatStore`] owns every repository and service and is the single entry
//! point callers use. It is cheap to clone; clones share the same state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use wtc_config::{AppConfig, SeedConfig, SESSION_SENDER};

use crate::entities::{Conversation, Group, Message, User, GROUP_PEER_PREFIX};
use crate::observable::Subscription;
use crate::repositories::{ConversationRepository, GroupRepository, MessageRepository, UserRepository};
use crate::services::{AccessService, MembershipService, MessageService, SearchService};
use crate::types::{
    events::DEFAULT_EVENT_CAPACITY, ChatEvent, ChatResult, ConversationId, EventBus, GroupId,
    SessionUser, UserId,
};

/// Display name of a session user that is neither seeded nor has an email.
const ANONYMOUS_SESSION_NAME: &str = "Usuário";

#[derive(Clone)]
pub struct ChatStore {
    users: Arc<UserRepository>,
    memberships: Arc<MembershipService>,
    messages: Arc<MessageService>,
    search: Arc<SearchService>,
    access: Arc<AccessService>,
    events: EventBus,
}

impl ChatStore {
    /// An empty store: no users, groups or conversations.
    pub fn new(default_group_id: impl Into<GroupId>) -> Self {
        Self::assemble(
            default_group_id.into(),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
            Vec::new(),
            HashMap::new(),
            EventBus::default(),
        )
    }

    /// Build a store from explicit seed data and the signed-in user.
    pub fn seeded(seed: &SeedConfig, session: &SessionUser) -> Self {
        Self::seeded_with_events(seed, session, EventBus::new(DEFAULT_EVENT_CAPACITY))
    }

    /// Build the store described by the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let session = SessionUser::from(&config.session);
        Self::seeded_with_events(&config.seed, &session, EventBus::new(config.events.capacity))
    }

    fn seeded_with_events(seed: &SeedConfig, session: &SessionUser, events: EventBus) -> Self {
        let now = Utc::now();

        let groups: Vec<Group> = seed
            .groups
            .iter()
            .map(|group| Group::new(&group.id, &group.name))
            .collect();

        let mut users = Vec::with_capacity(seed.users.len() + 1);
        let mut memberships = HashMap::new();
        for seeded in &seed.users {
            let mut user = User::new(&seeded.id, &seeded.name);
            user.email = seeded.email.clone();
            user.avatar_url = seeded.avatar_url.clone();

            if user.id == session.id && user.email.is_none() {
                user.email = session.email.clone();
            }
            if let Some(group_id) = &seeded.group_id {
                memberships.insert(user.id.clone(), group_id.clone());
            }
            users.push(user);
        }

        if !users.iter().any(|user| user.id == session.id) {
            let name = session
                .email
                .clone()
                .unwrap_or_else(|| ANONYMOUS_SESSION_NAME.to_string());
            let mut user = User::new(&session.id, name);
            user.email = session.email.clone();
            debug!(user_id = %session.id, "adding session user to seed data");
            users.push(user);
        }
        memberships.insert(session.id.clone(), seed.default_group_id.clone());

        let conversations: Vec<Conversation> = seed
            .conversations
            .iter()
            .filter_map(|seeded| {
                let peer = Self::seed_peer(&seeded.peer_user_id, &users, &groups);
                if peer.is_none() {
                    warn!(
                        conversation_id = %seeded.id,
                        peer_user_id = %seeded.peer_user_id,
                        "skipping seed conversation with unknown peer"
                    );
                }
                let conversation = Conversation::new(
                    &seeded.id,
                    peer?,
                    &seeded.last_message,
                    minutes_before(now, seeded.minutes_ago),
                );
                Some(conversation.with_unread(seeded.unread_count))
            })
            .collect();

        let mut messages: HashMap<ConversationId, Vec<Message>> = HashMap::new();
        for seeded in &seed.messages {
            let sender_id = if seeded.sender_id == SESSION_SENDER {
                session.id.as_str()
            } else {
                seeded.sender_id.as_str()
            };
            let message = Message::new(&seeded.conversation_id, sender_id, &seeded.content)
                .with_id(&seeded.id)
                .at(minutes_before(now, seeded.minutes_ago));
            messages
                .entry(seeded.conversation_id.clone())
                .or_default()
                .push(message);
        }

        info!(
            groups = groups.len(),
            users = users.len(),
            conversations = conversations.len(),
            messages = seed.messages.len(),
            "chat store seeded"
        );

        Self::assemble(
            seed.default_group_id.clone(),
            groups,
            users,
            memberships,
            conversations,
            messages,
            events,
        )
    }

    /// Peer of a seeded conversation; `group:<id>` peers become placeholders.
    fn seed_peer(peer_user_id: &str, users: &[User], groups: &[Group]) -> Option<User> {
        if let Some(group_id) = peer_user_id.strip_prefix(GROUP_PEER_PREFIX) {
            return match groups.iter().find(|group| group.id == group_id) {
                Some(group) => Some(User::group_placeholder(group)),
                None => {
                    warn!(group_id, "seed conversation names an unknown group");
                    Some(User::new(peer_user_id, group_id))
                }
            };
        }

        users.iter().find(|user| user.id == peer_user_id).cloned()
    }

    fn assemble(
        default_group_id: GroupId,
        groups: Vec<Group>,
        users: Vec<User>,
        memberships: HashMap<UserId, GroupId>,
        conversations: Vec<Conversation>,
        messages: HashMap<ConversationId, Vec<Message>>,
        events: EventBus,
    ) -> Self {
        let users = Arc::new(UserRepository::new(users));
        let groups = Arc::new(GroupRepository::new(default_group_id, groups, memberships));
        let conversations = Arc::new(ConversationRepository::new(conversations));
        let messages = Arc::new(MessageRepository::new(messages));

        Self {
            memberships: Arc::new(MembershipService::new(
                users.clone(),
                groups.clone(),
                events.clone(),
            )),
            messages: Arc::new(MessageService::new(
                conversations.clone(),
                messages,
                groups.clone(),
                events.clone(),
            )),
            search: Arc::new(SearchService::new(users.clone(), groups.clone())),
            access: Arc::new(AccessService::new(conversations, groups)),
            users,
            events,
        }
    }

    // Conversations and messages

    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        sender_id: &str,
    ) -> ChatResult<Message> {
        self.messages
            .send_message(conversation_id, content, sender_id)
            .await
    }

    pub async fn messages(&self, conversation_id: &str) -> Vec<Message> {
        self.messages.messages(conversation_id).await
    }

    pub async fn subscribe_messages(&self, conversation_id: &str) -> Subscription<Vec<Message>> {
        self.messages.subscribe_messages(conversation_id).await
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.messages.conversations()
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.messages.find_conversation(conversation_id)
    }

    pub fn subscribe_conversations(&self) -> Subscription<Vec<Conversation>> {
        self.messages.subscribe_conversations()
    }

    // Users and groups

    pub fn users(&self) -> Vec<User> {
        self.users.all()
    }

    pub fn subscribe_users(&self) -> Subscription<Vec<User>> {
        self.users.subscribe_all()
    }

    pub fn user_by_id(&self, user_id: &str) -> Option<User> {
        self.users.find_by_id(user_id)
    }

    pub async fn subscribe_user(&self, user_id: &str) -> Subscription<Option<User>> {
        self.users.subscribe_user(user_id).await
    }

    pub fn groups(&self) -> Vec<Group> {
        self.memberships.groups()
    }

    pub fn subscribe_groups(&self) -> Subscription<Vec<Group>> {
        self.memberships.subscribe_groups()
    }

    pub async fn group_members(&self, group_id: &str) -> Vec<User> {
        self.memberships.group_members(group_id).await
    }

    pub async fn subscribe_group_members(&self, group_id: &str) -> Subscription<Vec<User>> {
        self.memberships.subscribe_group_members(group_id).await
    }

    // Membership

    pub async fn add_user_to_group_by_email(&self, group_id: &str, email: &str) -> ChatResult<User> {
        self.memberships
            .add_user_to_group_by_email(group_id, email)
            .await
    }

    pub async fn remove_user_from_group(&self, group_id: &str, user_id: &str) -> ChatResult<()> {
        self.memberships
            .remove_user_from_group(group_id, user_id)
            .await
    }

    pub async fn user_group_id(&self, user_id: &str) -> Option<GroupId> {
        self.memberships.user_group_id(user_id).await
    }

    pub async fn effective_group_id(&self, user_id: &str) -> GroupId {
        self.memberships.effective_group_id(user_id).await
    }

    pub async fn subscribe_user_group_id(&self, user_id: &str) -> Subscription<GroupId> {
        self.memberships.subscribe_user_group_id(user_id).await
    }

    pub fn default_group_id(&self) -> &str {
        self.memberships.default_group_id()
    }

    // Search and access

    pub async fn search_users(&self, query: &str, within_group_id: Option<&str>) -> Vec<User> {
        self.search.search_users(query, within_group_id).await
    }

    pub fn filter_conversations(&self, query: &str) -> Vec<Conversation> {
        SearchService::filter_conversations(&self.conversations(), query)
    }

    pub async fn authorize_conversation(
        &self,
        session: &SessionUser,
        conversation_id: &str,
        peer_user_id: Option<&str>,
    ) -> ChatResult<()> {
        self.access
            .authorize_conversation(session, conversation_id, peer_user_id)
            .await
    }

    /// Listen to every mutation as a [`ChatEvent`].
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }
}

/// `now` shifted back by `minutes`, clamped to `now` when out of range.
fn minutes_before(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    Duration::try_minutes(minutes)
        .and_then(|offset| now.checked_sub_signed(offset))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatError;

    fn demo_store() -> ChatStore {
        ChatStore::seeded(&SeedConfig::default(), &SessionUser::client("me"))
    }

    #[tokio::test]
    async fn test_demo_seed() {
        let store = demo_store();

        assert_eq!(store.groups().len(), 3);
        assert_eq!(store.users().len(), 5);
        for user in store.users() {
            assert_eq!(store.user_group_id(&user.id).await.as_deref(), Some("g0"));
        }

        let ids: Vec<_> = store.conversations().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "group_g0"]);

        let group = store.conversation("group_g0").unwrap();
        assert_eq!(group.peer_user.id, "group:g0");
        assert_eq!(group.peer_user.name, "WTC Connect");
        assert_eq!(group.peer_user.email, None);

        let c1 = store.messages("c1").await;
        assert_eq!(c1.len(), 2);
        assert_eq!(c1[1].id, "m2");
        assert_eq!(c1[1].sender_id, "me");
        assert!(c1[0].timestamp < c1[1].timestamp);
        assert_eq!(store.messages("group_g0").await.len(), 2);
    }

    #[tokio::test]
    async fn test_session_user_rules() {
        let seeded = SessionUser::client("me").with_email("me@wtc.com");
        let store = ChatStore::seeded(&SeedConfig::default(), &seeded);
        assert_eq!(store.user_by_id("me").unwrap().email.as_deref(), Some("me@wtc.com"));

        let outsider = SessionUser::client("x9").with_email("x9@wtc.com");
        let store = ChatStore::seeded(&SeedConfig::default(), &outsider);
        let user = store.user_by_id("x9").unwrap();
        assert_eq!(user.name, "x9@wtc.com");
        assert_eq!(store.user_group_id("x9").await.as_deref(), Some("g0"));

        let anonymous = SessionUser::client("anon");
        let store = ChatStore::seeded(&SeedConfig::default(), &anonymous);
        assert_eq!(store.user_by_id("anon").unwrap().name, "Usuário");
        assert_eq!(store.messages("c1").await[1].sender_id, "anon");
    }

    #[tokio::test]
    async fn test_seed_skips_unknown_peers() {
        let mut seed = SeedConfig::default();
        seed.conversations.push(wtc_config::SeedConversation {
            id: "c9".to_string(),
            peer_user_id: "ghost".to_string(),
            last_message: "boo".to_string(),
            minutes_ago: 1,
            unread_count: 0,
        });
        seed.conversations.push(wtc_config::SeedConversation {
            id: "group_g7".to_string(),
            peer_user_id: "group:g7".to_string(),
            last_message: "hi".to_string(),
            minutes_ago: i64::MAX,
            unread_count: 0,
        });

        let store = ChatStore::seeded(&seed, &SessionUser::client("me"));
        assert!(store.conversation("c9").is_none());
        let orphan = store.conversation("group_g7").unwrap();
        assert!(orphan.peer_user.is_group_placeholder());
        assert_eq!(orphan.peer_user.name, "g7");
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = ChatStore::new("g0");

        assert!(store.users().is_empty());
        assert!(store.groups().is_empty());
        assert!(store.conversations().is_empty());
        assert_eq!(store.effective_group_id("anyone").await, "g0");

        store.send_message("group_g0", "hello", "me").await.unwrap();
        assert!(store.conversations().is_empty());
        assert_eq!(store.messages("group_g0").await.len(), 1);
    }

    #[tokio::test]
    async fn test_removed_user_falls_back_to_default_group() {
        let store = demo_store();

        store.remove_user_from_group("g0", "u2").await.unwrap();
        assert_eq!(store.user_group_id("u2").await, None);
        assert_eq!(store.effective_group_id("u2").await, "g0");

        let error = store.remove_user_from_group("g0", "u2").await.unwrap_err();
        assert_eq!(error, ChatError::not_a_member("u2", "g0"));
    }

    #[tokio::test]
    async fn test_filter_conversations() {
        let store = demo_store();

        let filtered = store.filter_conversations("wtc");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "group_g0");
        assert_eq!(store.filter_conversations("").len(), 4);
    }

    #[tokio::test]
    async fn test_subscription_ends_with_store() {
        let store = demo_store();
        let mut conversations = store.subscribe_conversations();
        assert_eq!(conversations.next().await.map(|list| list.len()), Some(4));

        drop(store);
        assert_eq!(conversations.next().await, None);
    }

    #[test]
    fn test_minutes_before_clamps() {
        let now = Utc::now();
        assert_eq!(minutes_before(now, 0), now);
        assert_eq!(minutes_before(now, 5), now - Duration::minutes(5));
        assert_eq!(minutes_before(now, i64::MAX), now);
    }
}
