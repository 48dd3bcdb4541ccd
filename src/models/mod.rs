pub mod action;
pub mod campaign;
pub mod device;
pub mod notification;

pub use action::Action;
pub use campaign::{ButtonSlot, CampaignNotification, CampaignStats, CampaignTiers, TierButton, TierView};
pub use device::{DeviceRegistration, Platform, RegistrationAck};
pub use notification::{
    DeliveryType, HeartbeatItem, HeartbeatResponse, Notification, NotificationId, PushPayload,
};
