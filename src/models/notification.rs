// src/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::action::Action;
use crate::models::campaign::CampaignTiers;
use crate::utils::lenient::deserialize_flag;
use crate::utils::time::deserialize_optional_timestamp;

pub type NotificationId = i64;

/// How the backend asked for a notification to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryType {
    Push,
    Popup,
    Fullscreen,
    Other(String),
}

impl DeliveryType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "push" => DeliveryType::Push,
            "popup" => DeliveryType::Popup,
            "fullscreen" => DeliveryType::Fullscreen,
            other => DeliveryType::Other(other.to_string()),
        }
    }

    /// Popup-eligible types interrupt the user immediately instead of waiting in the list.
    pub fn is_popup_eligible(&self) -> bool {
        matches!(self, DeliveryType::Popup | DeliveryType::Fullscreen)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeliveryType::Push => "push",
            DeliveryType::Popup => "popup",
            DeliveryType::Fullscreen => "fullscreen",
            DeliveryType::Other(raw) => raw,
        }
    }
}

/// A transactional notification as stored in the user's inbox.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Notification {
    #[serde(rename = "user_notification_id")]
    pub id: NotificationId,
    #[serde(default)]
    pub notification_id: Option<NotificationId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub type_field: String, // Use type_field instead of r#type
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_data: Option<Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl Notification {
    pub fn delivery_type(&self) -> DeliveryType {
        DeliveryType::parse(&self.type_field)
    }

    /// Parsed click action, `None` when absent or malformed.
    pub fn action(&self) -> Option<Action> {
        Action::from_parts(self.action_type.as_deref()?, self.action_data.as_ref())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct NotificationListResponse {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UnreadCountResponse {
    #[serde(rename = "unreadCount", alias = "unread_count", default)]
    pub unread_count: u64,
}

/// Answer to "anything new since my last check?"
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    #[serde(default)]
    pub has_new: bool,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub notifications: Vec<HeartbeatItem>,
    #[serde(default)]
    pub last_check_at: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HeartbeatItem {
    pub notification_id: NotificationId,
    #[serde(default)]
    pub user_notification_id: Option<NotificationId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub type_field: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_data: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub tiers: CampaignTiers,
}

impl HeartbeatItem {
    pub fn delivery_type(&self) -> DeliveryType {
        DeliveryType::parse(&self.type_field)
    }

    /// Inbox entry for this item, when the backend told us its per-user id.
    pub fn to_notification(&self) -> Option<Notification> {
        Some(Notification {
            id: self.user_notification_id?,
            notification_id: Some(self.notification_id),
            title: self.title.clone(),
            message: self.message.clone(),
            type_field: self.type_field.clone(),
            is_read: false,
            created_at: self.created_at,
            action_type: self.action_type.clone(),
            action_data: self.action_data.clone(),
            image_url: self.image_url.clone(),
            priority: None,
        })
    }
}

/// A push delivered by the platform while the app is in the foreground.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub data: PushData,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    #[serde(default)]
    pub notification_id: Option<NotificationId>,
    #[serde(rename = "type", default)]
    pub type_field: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_data: Option<Value>,
}

impl PushPayload {
    pub fn delivery_type(&self) -> DeliveryType {
        DeliveryType::parse(self.data.type_field.as_deref().unwrap_or("push"))
    }

    pub fn action(&self) -> Option<Action> {
        Action::from_parts(self.data.action_type.as_deref()?, self.data.action_data.as_ref())
    }
}
