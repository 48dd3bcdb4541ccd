//! Notification sync and popup coordination for the marketplace app.
//!
//! Polls the backend heartbeat, merges platform pushes, keeps the unread badge and inbox in
//! an owned [`coordinator::NotificationStore`] and arbitrates the single visible popup.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod models;
pub mod popup;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, CampaignBackend, NotificationBackend};
pub use config::Config;
pub use coordinator::{
    ActionSink, CampaignFeed, CoordinatorSettings, HeartbeatOutcome, NotificationCoordinator,
    NotificationState, NotificationStore,
};
pub use error::{NotificationError, Result};
pub use popup::{PopupEvent, PopupNotification, PopupSession, PopupState};
