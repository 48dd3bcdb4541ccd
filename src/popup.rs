//! Interruptive popup: the payload being shown and the tiered presentation state machine.

use crate::models::{
    Action, ButtonSlot, CampaignNotification, CampaignTiers, DeliveryType, HeartbeatItem,
    NotificationId, PushPayload, TierView,
};

/// Presentation tier of the current popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Closed,
    Collapsed,
    Expanded,
    Fullscreen,
}

/// User input driving [`PopupState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupEvent {
    /// Tap on the popup body: one level up.
    Tap,
    /// Collapse / back gesture: one level down, closing from the banner.
    Back,
    Close,
    /// A dismiss, navigate or open-link action finished.
    ActionCompleted,
}

impl PopupState {
    /// Transition table. `Closed` is terminal.
    pub fn next(self, event: PopupEvent) -> PopupState {
        use PopupEvent::*;
        use PopupState::*;

        match (self, event) {
            (Closed, _) => Closed,
            (_, Close) | (_, ActionCompleted) => Closed,
            (Collapsed, Tap) => Expanded,
            (Expanded, Tap) => Fullscreen,
            (Fullscreen, Tap) => Fullscreen,
            (Collapsed, Back) => Closed,
            (Expanded, Back) => Collapsed,
            (Fullscreen, Back) => Expanded,
        }
    }

    pub fn is_open(self) -> bool {
        self != PopupState::Closed
    }
}

/// What the popup shows, independent of which tier is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupNotification {
    pub id: NotificationId,
    pub title: Option<String>,
    pub message: Option<String>,
    pub kind: DeliveryType,
    pub image_url: Option<String>,
    pub action: Option<Action>,
    pub tiers: CampaignTiers,
    pub is_read: bool,
}

impl From<&HeartbeatItem> for PopupNotification {
    fn from(item: &HeartbeatItem) -> Self {
        Self {
            id: item.notification_id,
            title: item.title.clone(),
            message: item.message.clone(),
            kind: item.delivery_type(),
            image_url: item.image_url.clone(),
            action: item
                .action_type
                .as_deref()
                .and_then(|t| Action::from_parts(t, item.action_data.as_ref())),
            tiers: item.tiers.clone(),
            is_read: false,
        }
    }
}

impl From<&CampaignNotification> for PopupNotification {
    fn from(campaign: &CampaignNotification) -> Self {
        Self {
            id: campaign.id,
            title: campaign.tiers.collapsed_title.clone(),
            message: campaign.tiers.collapsed_message.clone(),
            kind: DeliveryType::Popup,
            image_url: None,
            action: None,
            tiers: campaign.tiers.clone(),
            is_read: campaign.is_read,
        }
    }
}

impl PopupNotification {
    /// Popup for a foreground push, if it carries an id and a popup-eligible type.
    pub fn from_push(payload: &PushPayload) -> Option<Self> {
        let kind = payload.delivery_type();
        if !kind.is_popup_eligible() {
            return None;
        }
        Some(Self {
            id: payload.data.notification_id?,
            title: payload.title.clone(),
            message: payload.body.clone(),
            kind,
            image_url: payload.data.image_url.clone(),
            action: payload.action(),
            tiers: CampaignTiers::default(),
            is_read: false,
        })
    }
}

/// The single popup currently surfaced, plus its tier.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupSession {
    pub notification: PopupNotification,
    pub state: PopupState,
}

impl PopupSession {
    /// New arrivals always start as the collapsed banner.
    pub fn new(notification: PopupNotification) -> Self {
        Self {
            notification,
            state: PopupState::Collapsed,
        }
    }

    /// Applies `event`; returns the resulting state.
    pub fn apply(&mut self, event: PopupEvent) -> PopupState {
        self.state = self.state.next(event);
        self.state
    }

    /// Content of the visible tier. `None` once closed.
    pub fn view(&self) -> Option<TierView> {
        let n = &self.notification;
        let (title, message) = (n.title.as_ref(), n.message.as_ref());
        match self.state {
            PopupState::Closed => None,
            PopupState::Collapsed => Some(n.tiers.collapsed(title, message)),
            PopupState::Expanded => Some(n.tiers.expanded(title, message)),
            PopupState::Fullscreen => Some(n.tiers.fullscreen(title, message)),
        }
    }

    /// Action bound to a button of the visible tier.
    pub fn button_action(&self, slot: ButtonSlot) -> Option<Action> {
        self.view()?.button(slot)?.action.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transition_table() {
        use PopupEvent::*;
        use PopupState::*;

        assert_eq!(Collapsed.next(Tap), Expanded);
        assert_eq!(Expanded.next(Tap), Fullscreen);
        assert_eq!(Fullscreen.next(Tap), Fullscreen);
        assert_eq!(Fullscreen.next(Back), Expanded);
        assert_eq!(Expanded.next(Back), Collapsed);
        assert_eq!(Collapsed.next(Back), Closed);
        for state in [Collapsed, Expanded, Fullscreen] {
            assert_eq!(state.next(Close), Closed);
            assert_eq!(state.next(ActionCompleted), Closed);
        }
        for event in [Tap, Back, Close, ActionCompleted] {
            assert_eq!(Closed.next(event), Closed);
        }
    }

    #[test]
    fn session_starts_collapsed_and_resolves_views() {
        let item: HeartbeatItem = serde_json::from_value(json!({
            "notification_id": 7,
            "type": "popup",
            "title": "T",
            "message": "M",
            "expanded_button_1_text": "Go",
            "expanded_button_1_action": {"type": "open_url", "url": "https://example.com"}
        }))
        .unwrap();
        let mut session = PopupSession::new(PopupNotification::from(&item));
        assert_eq!(session.state, PopupState::Collapsed);
        assert_eq!(session.view().unwrap().title, "T");
        assert!(session.button_action(ButtonSlot::Primary).is_none());

        session.apply(PopupEvent::Tap);
        assert_eq!(
            session.button_action(ButtonSlot::Primary),
            Some(Action::OpenUrl { url: "https://example.com".into() })
        );

        session.apply(PopupEvent::Close);
        assert!(session.view().is_none());
    }

    #[test]
    fn push_without_popup_type_is_not_surfaced() {
        let push: PushPayload = serde_json::from_value(json!({
            "title": "Hi",
            "data": {"notificationId": 3, "type": "push"}
        }))
        .unwrap();
        assert!(PopupNotification::from_push(&push).is_none());

        let push: PushPayload = serde_json::from_value(json!({
            "title": "Hi",
            "body": "There",
            "data": {"notificationId": 3, "type": "fullscreen"}
        }))
        .unwrap();
        let popup = PopupNotification::from_push(&push).unwrap();
        assert_eq!(popup.id, 3);
        assert_eq!(popup.message.as_deref(), Some("There"));
    }
}
