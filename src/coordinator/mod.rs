//! Notification synchronization and popup arbitration.
//!
//! The coordinator owns the poll cadence, merges polled and pushed notifications into the
//! [`NotificationStore`], tracks read state and decides which single notification may
//! surface as a popup.

pub mod campaign;
pub mod store;

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use chrono::Utc;
use moka::sync::Cache;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::NotificationBackend;
use crate::config::{Config, DEFAULT_HEARTBEAT_SECS, DEFAULT_PAGE_SIZE};
use crate::error::Result;
use crate::models::{
    Action, ButtonSlot, DeviceRegistration, Notification, NotificationId, Platform, PushPayload,
    RegistrationAck,
};
use crate::popup::{PopupEvent, PopupNotification, PopupState};
use crate::storage::DeviceIdentity;

pub use campaign::{CampaignFeed, CampaignState};
pub use store::{Epoch, NotificationState, NotificationStore};

/// How long a pushed popup id waits for the heartbeat that echoes it.
const PUSHED_TTL: Duration = Duration::from_secs(10 * 60);
const PUSHED_CAPACITY: u64 = 256;

/// Host-side navigation hooks. Implemented by the UI layer.
pub trait ActionSink: Send + Sync {
    fn open_url(&self, url: &str);
    fn open_screen(&self, screen: &str, params: &Value);
}

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub heartbeat_interval: Duration,
    pub page_size: u32,
    pub platform: Platform,
    pub device_name: Option<String>,
    pub push_token: Option<String>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            platform: Platform::current(),
            device_name: None,
            push_token: None,
        }
    }
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval,
            page_size: config.page_size,
            platform: Platform::current(),
            device_name: Some(config.device_name.clone()),
            push_token: config.push_token.clone(),
        }
    }
}

/// Result of one heartbeat round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum HeartbeatOutcome {
    NoChange,
    New {
        count: u64,
        popup: Option<NotificationId>,
    },
    /// The coordinator was torn down while the request was in flight; nothing was applied.
    Stale,
}

struct Poller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner<B> {
    backend: Arc<B>,
    identity: DeviceIdentity,
    store: NotificationStore,
    settings: CoordinatorSettings,
    push_token: RwLock<Option<String>>,
    /// Popups already shown by a push, until a heartbeat carries the same id.
    pushed: Cache<NotificationId, ()>,
    poller: Mutex<Option<Poller>>,
}

/// ✅ **Notification coordinator**
///
/// Cheap to clone; clones share the same store and poll task.
pub struct NotificationCoordinator<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for NotificationCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<B: NotificationBackend> NotificationCoordinator<B> {
    pub fn new(backend: Arc<B>, identity: DeviceIdentity, settings: CoordinatorSettings) -> Self {
        let push_token = RwLock::new(settings.push_token.clone());
        Self {
            inner: Arc::new(Inner {
                backend,
                identity,
                store: NotificationStore::new(),
                settings,
                push_token,
                pushed: Cache::builder()
                    .max_capacity(PUSHED_CAPACITY)
                    .time_to_live(PUSHED_TTL)
                    .build(),
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.inner.store
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.inner.store.subscribe()
    }

    pub fn snapshot(&self) -> NotificationState {
        self.inner.store.snapshot()
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.poller).is_some()
    }

    // --- Lifecycle ---

    /// Mount: fresh state, register the device, then poll every heartbeat period.
    pub fn start(&self) {
        let mut poller = lock(&self.inner.poller);
        if poller.is_some() {
            debug!("notification coordinator already running");
            return;
        }

        self.inner.store.reset();
        let token = CancellationToken::new();
        let handle = tokio::spawn(self.clone().run(token.clone()));
        *poller = Some(Poller { token, handle });
        info!(
            interval_secs = self.inner.settings.heartbeat_interval.as_secs(),
            "notification coordinator started"
        );
    }

    /// Unmount: stop polling and turn every in-flight response into a no-op.
    pub async fn stop(&self) {
        let poller = lock(&self.inner.poller).take();
        self.inner.store.teardown();
        if let Some(poller) = poller {
            poller.token.cancel();
            if let Err(e) = poller.handle.await {
                warn!(error = %e, "heartbeat loop ended abnormally");
            }
            info!("notification coordinator stopped");
        }
    }

    async fn run(self, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = self.initialize() => {}
        }

        let mut ticker = tokio::time::interval(self.inner.settings.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    // Each heartbeat runs on its own so a slow response never delays the next tick.
                    let this = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = this.heartbeat().await {
                            warn!(error = %e, "heartbeat failed");
                        }
                    });
                }
            }
        }
        debug!("heartbeat loop exited");
    }

    async fn initialize(&self) {
        if let Err(e) = self.register_device().await {
            warn!(error = %e, "device registration failed");
        }
        let _ = self.fetch_unread_count().await;
    }

    // --- Device registration ---

    pub fn set_push_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.inner.push_token.write() {
            *current = token;
        }
    }

    pub fn push_token(&self) -> Option<String> {
        self.inner.push_token.read().ok().and_then(|t| t.clone())
    }

    /// Registers this install with the backend. `Ok(None)` when no push token is available.
    pub async fn register_device(&self) -> Result<Option<RegistrationAck>> {
        let Some(device_token) = self.push_token() else {
            info!("no push token available, skipping device registration");
            return Ok(None);
        };

        let registration = DeviceRegistration {
            device_token: device_token.clone(),
            platform: self.inner.settings.platform,
            device_id: self.inner.identity.device_id()?,
            device_name: self.inner.settings.device_name.clone(),
        };

        let ack = self.inner.backend.register_device(&registration).await?;
        self.inner.identity.remember_push_token(&device_token)?;
        info!(device_id = %registration.device_id, "device registered with backend");
        Ok(Some(ack))
    }

    /// Removes the last registered push token from the backend and forgets it locally.
    pub async fn unregister_device(&self) -> Result<()> {
        if let Some(token) = self.inner.identity.push_token()? {
            self.inner.backend.remove_device_token(&token).await?;
            self.inner.identity.forget_push_token()?;
            info!("device token unregistered");
        }
        Ok(())
    }

    /// Login transition: register again, then reload count and first page.
    pub async fn on_login(&self) {
        if let Err(e) = self.register_device().await {
            warn!(error = %e, "device registration after login failed");
        }
        let _ = self.fetch_unread_count().await;
        let _ = self.fetch_notifications(self.inner.settings.page_size, 0).await;
    }

    /// Logout transition: drop the device token and everything user-specific.
    pub async fn on_logout(&self) {
        if let Err(e) = self.unregister_device().await {
            warn!(error = %e, "failed to unregister device token");
        }
        self.inner.store.update(|s| {
            s.notifications.clear();
            s.unread_count = 0;
            s.popup = None;
        });
    }

    // --- Polling ---

    /// One heartbeat: ask what is new since the last successful check.
    pub async fn heartbeat(&self) -> Result<HeartbeatOutcome> {
        let store = &self.inner.store;
        let epoch = store.epoch();
        let device_id = self.inner.identity.device_id()?;
        let last_check = store.read(|s| s.last_check.clone());

        // On failure `last_check` stays put so the next poll re-requests the same window.
        let response = self
            .inner
            .backend
            .heartbeat(&device_id, last_check.as_deref())
            .await?;

        let next_check = response
            .last_check_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        let has_new = response.has_new && !response.notifications.is_empty();

        let newest = if has_new {
            response
                .notifications
                .iter()
                .filter(|item| item.delivery_type().is_popup_eligible())
                .last()
        } else {
            None
        };
        // A push already showed this one; the heartbeat only echoes it.
        let popup = newest
            .filter(|item| !self.inner.pushed.contains_key(&item.notification_id))
            .map(PopupNotification::from);
        let echoed = newest
            .map(|item| item.notification_id)
            .filter(|id| popup.as_ref().map(|p| p.id) != Some(*id));
        let popup_id = popup.as_ref().map(|p| p.id);
        let incoming: Vec<Notification> = if has_new {
            response.notifications.iter().filter_map(|i| i.to_notification()).collect()
        } else {
            Vec::new()
        };

        let applied = store.apply(epoch, |s| {
            s.last_check = Some(next_check);
            s.prepend_notifications(incoming);
            if let Some(popup) = popup {
                if let Some(displaced) = s.show_popup(popup) {
                    debug!(displaced, "unconsumed popup replaced by a newer one");
                }
            }
        });
        if !applied {
            debug!("heartbeat response arrived after teardown, ignoring");
            return Ok(HeartbeatOutcome::Stale);
        }

        if !has_new {
            return Ok(HeartbeatOutcome::NoChange);
        }

        if let Some(id) = echoed {
            debug!(notification_id = id, "heartbeat echoed a pushed popup");
            self.inner.pushed.invalidate(&id);
        }
        info!(count = response.count, popup = ?popup_id, "heartbeat: new notifications");
        let _ = self.unread_count_in(epoch).await;

        Ok(HeartbeatOutcome::New {
            count: response.count,
            popup: popup_id,
        })
    }

    // --- Reads ---

    /// Authoritative unread count. Guests read as zero without a backend call.
    pub async fn fetch_unread_count(&self) -> Result<u64> {
        self.unread_count_in(self.inner.store.epoch()).await
    }

    async fn unread_count_in(&self, epoch: Epoch) -> Result<u64> {
        if !self.inner.backend.is_authenticated() {
            self.inner.store.apply(epoch, |s| s.unread_count = 0);
            return Ok(0);
        }

        match self.inner.backend.unread_count().await {
            Ok(count) => {
                self.inner.store.apply(epoch, |s| s.unread_count = count);
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch unread count");
                Err(e)
            }
        }
    }

    /// Loads a page of the inbox. Offset 0 replaces the list; later pages are merged in.
    pub async fn fetch_notifications(&self, limit: u32, offset: u32) -> Result<Vec<Notification>> {
        let store = &self.inner.store;
        let epoch = store.epoch();
        store.apply(epoch, |s| s.loading = true);

        let result = self.inner.backend.list_notifications(limit, offset).await;

        store.apply(epoch, |s| {
            s.loading = false;
            if let Ok(items) = &result {
                if offset == 0 {
                    s.replace_notifications(items.clone());
                } else {
                    s.append_notifications(items.clone());
                }
            }
        });

        if let Err(e) = &result {
            warn!(error = %e, limit, offset, "failed to fetch notifications");
        }
        result
    }

    /// Next page after what is already loaded.
    pub async fn fetch_next_page(&self) -> Result<Vec<Notification>> {
        let offset = self.inner.store.read(|s| s.notifications.len()) as u32;
        self.fetch_notifications(self.inner.settings.page_size, offset).await
    }

    // --- Mutations (optimistic; the next fetch reconciles) ---

    pub async fn mark_as_read(&self, id: NotificationId) -> Result<()> {
        let epoch = self.inner.store.epoch();
        self.inner.store.apply(epoch, |s| {
            s.mark_read(id);
        });

        let result = self.inner.backend.mark_read(id).await;
        if let Err(e) = &result {
            warn!(notification_id = id, error = %e, "failed to mark notification as read");
        }
        let _ = self.unread_count_in(epoch).await;
        result
    }

    pub async fn mark_as_clicked(&self, id: NotificationId) -> Result<()> {
        let result = self.inner.backend.mark_clicked(id).await;
        if let Err(e) = &result {
            warn!(notification_id = id, error = %e, "failed to mark notification as clicked");
        }
        result
    }

    pub async fn mark_all_as_read(&self) -> Result<()> {
        let epoch = self.inner.store.epoch();
        self.inner.store.apply(epoch, |s| s.mark_all_read());

        let result = self.inner.backend.mark_all_read().await;
        if let Err(e) = &result {
            warn!(error = %e, "failed to mark all notifications as read");
        }
        let _ = self.unread_count_in(epoch).await;
        result
    }

    pub async fn delete_notification(&self, id: NotificationId) -> Result<()> {
        let epoch = self.inner.store.epoch();
        self.inner.store.apply(epoch, |s| {
            s.remove(id);
        });

        let result = self.inner.backend.delete(id).await;
        if let Err(e) = &result {
            warn!(notification_id = id, error = %e, "failed to delete notification");
        }
        let _ = self.unread_count_in(epoch).await;
        result
    }

    // --- Popup ---

    /// Surface `popup`, replacing any unconsumed one.
    pub fn show_popup(&self, popup: PopupNotification) {
        self.inner.store.update(|s| {
            s.show_popup(popup);
        });
    }

    pub fn close_popup(&self) {
        self.popup_event(PopupEvent::Close);
    }

    /// Drive the popup state machine. Reaching `Closed` releases the popup.
    pub fn popup_event(&self, event: PopupEvent) -> PopupState {
        let mut state = PopupState::Closed;
        self.inner.store.update(|s| state = s.apply_popup_event(event));
        state
    }

    /// Press a button of the visible tier. Missing or malformed actions are ignored and the
    /// popup stays open.
    pub async fn activate_popup_button(&self, slot: ButtonSlot, sink: &dyn ActionSink) -> Option<Action> {
        let (id, action) = self.inner.store.read(|s| {
            s.popup
                .as_ref()
                .map(|p| (p.notification.id, p.button_action(slot)))
        })?;

        let Some(action) = action else {
            debug!(notification_id = id, ?slot, "popup button has no usable action");
            return None;
        };
        self.perform(id, &action, sink).await;
        Some(action)
    }

    /// Tap on the body of a plain popup: run its own action, if any.
    pub async fn activate_popup(&self, sink: &dyn ActionSink) -> Option<Action> {
        let (id, action) = self
            .inner
            .store
            .read(|s| s.popup.as_ref().map(|p| (p.notification.id, p.notification.action.clone())))?;

        let action = action?;
        self.perform(id, &action, sink).await;
        Some(action)
    }

    async fn perform(&self, id: NotificationId, action: &Action, sink: &dyn ActionSink) {
        // Close first, and only if the same popup is still showing.
        self.inner.store.update(|s| {
            if s.popup.as_ref().map(|p| p.notification.id) == Some(id) {
                s.apply_popup_event(PopupEvent::ActionCompleted);
            }
        });

        match action {
            Action::Dismiss => return,
            Action::OpenUrl { url } => sink.open_url(url),
            Action::OpenScreen { screen, params } => sink.open_screen(screen, params),
        }

        let _ = self.mark_as_clicked(id).await;
    }

    // --- Platform push ---

    /// Foreground push: surface it when popup-eligible, then refresh the count.
    pub async fn handle_push_received(&self, payload: &PushPayload) -> bool {
        let popup = PopupNotification::from_push(payload)
            .filter(|p| !self.inner.pushed.contains_key(&p.id));

        let surfaced = match popup {
            Some(popup) => {
                debug!(notification_id = popup.id, "surfacing pushed notification");
                self.inner.pushed.insert(popup.id, ());
                self.show_popup(popup);
                true
            }
            None => false,
        };

        let _ = self.fetch_unread_count().await;
        surfaced
    }

    /// User tapped a push: report the click and hand back the action to perform.
    pub async fn handle_push_response(&self, payload: &PushPayload) -> Option<Action> {
        if let Some(id) = payload.data.notification_id {
            let _ = self.mark_as_clicked(id).await;
        }
        let action = payload.action();
        let _ = self.fetch_unread_count().await;
        action
    }
}
