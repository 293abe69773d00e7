//! Push-based snapshot streams.
//!
//! An [`Observable`] owns the current snapshot of some piece of store state.
//! Mutations replace or edit the snapshot in place and every live
//! [`Subscription`] is woken. A fresh subscription replays the current
//! snapshot first, so observers never have to query and subscribe
//! separately. Observers that fall behind only see the newest snapshot.

use tokio::sync::watch;

#[derive(Debug)]
pub struct Observable<T> {
    sender: watch::Sender<T>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Subscribe; the first `next()` yields the current snapshot.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut receiver = self.sender.subscribe();
        receiver.mark_changed();
        Subscription { receiver }
    }

    /// Replace the snapshot and notify every subscriber.
    pub fn publish(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Edit the snapshot in place and notify every subscriber.
    pub fn modify(&self, edit: impl FnOnce(&mut T)) {
        self.sender.send_modify(edit);
    }

    /// Edit the snapshot in place; subscribers are notified only when the
    /// closure reports a change.
    pub fn modify_if(&self, edit: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(edit)
    }

    /// Run `read` against the current snapshot without cloning it.
    pub fn read<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.sender.borrow())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Observable<T> {
    pub fn snapshot(&self) -> T {
        self.sender.borrow().clone()
    }
}

impl<T: PartialEq> Observable<T> {
    /// Publish `value` unless it equals the current snapshot.
    pub fn publish_if_changed(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Receiving end of an [`Observable`]. Dropping it cancels the subscription.
#[derive(Debug, Clone)]
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the owning store is gone and the last snapshot
    /// was already observed.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Whether a snapshot is waiting to be observed.
    #[cfg(test)]
    pub(crate) fn has_pending(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}
