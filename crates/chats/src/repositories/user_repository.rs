//! Repository for users.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::entities::User;
use crate::observable::{Observable, Subscription};
use crate::types::UserId;

/// In-memory user collection, kept in creation order
pub struct UserRepository {
    users: Observable<Vec<User>>,
    watchers: RwLock<HashMap<UserId, Observable<Option<User>>>>,
}

impl UserRepository {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Observable::new(users),
            watchers: RwLock::new(HashMap::new()),
        }
    }

    pub fn all(&self) -> Vec<User> {
        self.users.snapshot()
    }

    pub fn find_by_id(&self, user_id: &str) -> Option<User> {
        self.users
            .read(|users| users.iter().find(|user| user.id == user_id).cloned())
    }

    /// Look a user up by email, creating one when nobody has that address.
    ///
    /// The lookup and the insert happen under the same snapshot lock, so two
    /// callers racing on one address still end up with a single user. The
    /// flag reports whether the user was created.
    pub async fn find_or_create_by_email(&self, email: &str) -> (User, bool) {
        let candidate = User::from_email(email);
        let mut existing = None;

        self.users.modify_if(|users| {
            if let Some(found) = users.iter().find(|user| user.has_email(email)) {
                existing = Some(found.clone());
                return false;
            }
            users.push(candidate.clone());
            true
        });

        match existing {
            Some(user) => (user, false),
            None => {
                self.notify(&candidate).await;
                (candidate, true)
            }
        }
    }

    pub fn subscribe_all(&self) -> Subscription<Vec<User>> {
        self.users.subscribe()
    }

    /// Stream of a single user; yields `None` until such a user exists.
    pub async fn subscribe_user(&self, user_id: &str) -> Subscription<Option<User>> {
        let mut watchers = self.watchers.write().await;
        watchers.retain(|_, watcher| watcher.subscriber_count() > 0);
        watchers
            .entry(user_id.to_string())
            .or_insert_with(|| Observable::new(self.find_by_id(user_id)))
            .subscribe()
    }

    async fn notify(&self, user: &User) {
        let mut watchers = self.watchers.write().await;
        watchers.retain(|_, watcher| watcher.subscriber_count() > 0);
        if let Some(watcher) = watchers.get(&user.id) {
            watcher.publish(Some(user.clone()));
        }
    }
}
