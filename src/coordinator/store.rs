//! Owned notification state shared between the coordinator and the views reading it.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::models::{Notification, NotificationId};
use crate::popup::{PopupEvent, PopupNotification, PopupSession, PopupState};

/// Snapshot of everything the notification views render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    pub unread_count: u64,
    pub notifications: Vec<Notification>,
    pub loading: bool,
    pub popup: Option<PopupSession>,
    /// Server timestamp of the last successful heartbeat.
    pub last_check: Option<String>,
}

impl NotificationState {
    /// Replaces the popup (last write wins). Returns the id of a displaced, unconsumed popup.
    pub fn show_popup(&mut self, popup: PopupNotification) -> Option<NotificationId> {
        let displaced = self.popup.take().map(|p| p.notification.id);
        self.popup = Some(PopupSession::new(popup));
        displaced
    }

    /// Applies a state-machine event; reaching `Closed` drops the popup.
    pub fn apply_popup_event(&mut self, event: PopupEvent) -> PopupState {
        let state = match self.popup.as_mut() {
            Some(session) => session.apply(event),
            None => PopupState::Closed,
        };
        if state == PopupState::Closed {
            self.popup = None;
        }
        state
    }

    /// Replace the inbox with a first page.
    pub fn replace_notifications(&mut self, items: Vec<Notification>) {
        self.notifications = dedup_by_id(items);
    }

    /// Append a later page, skipping ids already present.
    pub fn append_notifications(&mut self, items: Vec<Notification>) {
        for item in items {
            if !self.contains(item.id) {
                self.notifications.push(item);
            }
        }
    }

    /// Put newly arrived items at the top, skipping ids already present. Returns how many were added.
    pub fn prepend_notifications(&mut self, items: Vec<Notification>) -> usize {
        let fresh: Vec<Notification> = dedup_by_id(items)
            .into_iter()
            .filter(|n| !self.contains(n.id))
            .collect();
        let added = fresh.len();
        self.notifications.splice(0..0, fresh);
        added
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    /// Local read flag; returns true if the item was unread.
    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.is_read = true;
        }
        self.unread_count = 0;
    }

    /// Removes exactly `id`. Returns the removed item.
    pub fn remove(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.notifications.iter().position(|n| n.id == id)?;
        let removed = self.notifications.remove(index);
        if !removed.is_read {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        Some(removed)
    }
}

fn dedup_by_id(items: Vec<Notification>) -> Vec<Notification> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|n| seen.insert(n.id)).collect()
}

/// Lifecycle generation. Results computed under an old epoch are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

/// ✅ **Explicitly owned notification store**
///
/// Mutations go through [`NotificationStore::apply`] with the epoch captured before the
/// operation suspended. [`NotificationStore::teardown`] bumps the epoch, so anything still
/// in flight lands as a no-op.
pub struct NotificationStore {
    state: watch::Sender<NotificationState>,
    epoch: AtomicU64,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(NotificationState::default());
        Self {
            state,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn epoch(&self) -> Epoch {
        Epoch(self.epoch.load(Ordering::SeqCst))
    }

    /// Receiver for views; it sees every committed change.
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&NotificationState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Run `f` against the state if `epoch` is still current. Returns whether it ran.
    pub fn apply(&self, epoch: Epoch, f: impl FnOnce(&mut NotificationState)) -> bool {
        self.state.send_if_modified(|state| {
            // Checked under the channel's write lock; `teardown` bumps under the same lock.
            if self.epoch.load(Ordering::SeqCst) != epoch.0 {
                return false;
            }
            f(state);
            true
        })
    }

    /// Apply under the current epoch (synchronous UI actions that never suspend).
    pub fn update(&self, f: impl FnOnce(&mut NotificationState)) {
        self.apply(self.epoch(), f);
    }

    /// Start a fresh lifecycle with empty state.
    pub fn reset(&self) -> Epoch {
        let mut next = 0;
        self.state.send_modify(|state| {
            next = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *state = NotificationState::default();
        });
        Epoch(next)
    }

    /// End the current lifecycle; late results become no-ops. State is left readable,
    /// with any in-flight `loading` flag cleared since its completion will be dropped.
    pub fn teardown(&self) {
        self.state.send_if_modified(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            std::mem::replace(&mut state.loading, false)
        });
    }
}
