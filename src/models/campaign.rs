// src/models/campaign.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::action::Action;
use crate::models::notification::NotificationId;
use crate::utils::lenient::{deserialize_flag, deserialize_optional_flag};
use crate::utils::time::deserialize_optional_timestamp;

pub const DEFAULT_ICON: &str = "🔔";
pub const COLLAPSED_ICON_BG: &str = "#10B981";
pub const EXPANDED_ICON_BG: &str = "#1E3A8A";
pub const PRIMARY_BUTTON_COLOR: &str = "#2563EB";
pub const EXPANDED_SECONDARY_BUTTON_COLOR: &str = "#FFFFFF";
pub const FULLSCREEN_SECONDARY_BUTTON_COLOR: &str = "#6B7280";

/// Which of a tier's two buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSlot {
    Primary,
    Secondary,
}

/// Per-tier content of a campaign notification, exactly as the backend sends it (flat columns).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CampaignTiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_icon_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_timestamp_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_icon_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_button_1_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_button_1_action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_button_1_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_button_2_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_button_2_action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_button_2_color: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub fullscreen_show_logo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_icon_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_subheading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_primary_button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_primary_button_action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_primary_button_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_secondary_button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_secondary_button_action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen_secondary_button_color: Option<String>,
}

/// Resolved, ready-to-show content of one presentation tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierView {
    pub icon: String,
    pub icon_bg_color: String,
    pub title: String,
    pub message: String,
    pub subheading: Option<String>,
    pub timestamp_text: Option<String>,
    pub show_logo: bool,
    pub buttons: Vec<TierButton>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierButton {
    pub slot: ButtonSlot,
    pub text: String,
    pub color: String,
    /// `None` when the backend sent no action or one we could not parse.
    pub action: Option<Action>,
}

impl TierView {
    pub fn button(&self, slot: ButtonSlot) -> Option<&TierButton> {
        self.buttons.iter().find(|b| b.slot == slot)
    }
}

/// First non-empty candidate.
fn pick(candidates: &[Option<&String>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn button(
    slot: ButtonSlot,
    text: &Option<String>,
    action: &Option<Value>,
    color: &Option<String>,
    default_color: &str,
) -> Option<TierButton> {
    let text = text.as_ref().filter(|t| !t.is_empty())?;
    Some(TierButton {
        slot,
        text: text.clone(),
        color: color.clone().unwrap_or_else(|| default_color.to_string()),
        action: action.as_ref().and_then(Action::from_button),
    })
}

impl CampaignTiers {
    /// Banner content. `title`/`message` are the plain notification fields used when no tier copy exists.
    pub fn collapsed(&self, title: Option<&String>, message: Option<&String>) -> TierView {
        TierView {
            icon: pick(&[self.collapsed_icon.as_ref()]).unwrap_or_else(|| DEFAULT_ICON.to_string()),
            icon_bg_color: pick(&[self.collapsed_icon_bg_color.as_ref()])
                .unwrap_or_else(|| COLLAPSED_ICON_BG.to_string()),
            title: pick(&[self.collapsed_title.as_ref(), title]).unwrap_or_default(),
            message: pick(&[self.collapsed_message.as_ref(), message]).unwrap_or_default(),
            subheading: None,
            timestamp_text: self.collapsed_timestamp_text.clone(),
            show_logo: false,
            buttons: Vec::new(),
        }
    }

    /// Expanded panel; falls back to the collapsed copy.
    pub fn expanded(&self, title: Option<&String>, message: Option<&String>) -> TierView {
        let buttons = [
            button(
                ButtonSlot::Primary,
                &self.expanded_button_1_text,
                &self.expanded_button_1_action,
                &self.expanded_button_1_color,
                PRIMARY_BUTTON_COLOR,
            ),
            button(
                ButtonSlot::Secondary,
                &self.expanded_button_2_text,
                &self.expanded_button_2_action,
                &self.expanded_button_2_color,
                EXPANDED_SECONDARY_BUTTON_COLOR,
            ),
        ];

        TierView {
            icon: pick(&[self.expanded_icon.as_ref(), self.collapsed_icon.as_ref()])
                .unwrap_or_else(|| DEFAULT_ICON.to_string()),
            icon_bg_color: pick(&[
                self.expanded_icon_bg_color.as_ref(),
                self.collapsed_icon_bg_color.as_ref(),
            ])
            .unwrap_or_else(|| EXPANDED_ICON_BG.to_string()),
            title: pick(&[self.expanded_title.as_ref(), self.collapsed_title.as_ref(), title])
                .unwrap_or_default(),
            message: pick(&[
                self.expanded_message.as_ref(),
                self.collapsed_message.as_ref(),
                message,
            ])
            .unwrap_or_default(),
            subheading: None,
            timestamp_text: self.collapsed_timestamp_text.clone(),
            show_logo: false,
            buttons: buttons.into_iter().flatten().collect(),
        }
    }

    /// Full-screen modal; falls back to expanded, then collapsed copy.
    pub fn fullscreen(&self, title: Option<&String>, message: Option<&String>) -> TierView {
        let buttons = [
            button(
                ButtonSlot::Primary,
                &self.fullscreen_primary_button_text,
                &self.fullscreen_primary_button_action,
                &self.fullscreen_primary_button_color,
                PRIMARY_BUTTON_COLOR,
            ),
            button(
                ButtonSlot::Secondary,
                &self.fullscreen_secondary_button_text,
                &self.fullscreen_secondary_button_action,
                &self.fullscreen_secondary_button_color,
                FULLSCREEN_SECONDARY_BUTTON_COLOR,
            ),
        ];

        TierView {
            icon: pick(&[
                self.fullscreen_icon.as_ref(),
                self.expanded_icon.as_ref(),
                self.collapsed_icon.as_ref(),
            ])
            .unwrap_or_else(|| DEFAULT_ICON.to_string()),
            icon_bg_color: pick(&[
                self.fullscreen_icon_bg_color.as_ref(),
                self.expanded_icon_bg_color.as_ref(),
                self.collapsed_icon_bg_color.as_ref(),
            ])
            .unwrap_or_else(|| EXPANDED_ICON_BG.to_string()),
            title: pick(&[
                self.fullscreen_heading.as_ref(),
                self.expanded_title.as_ref(),
                self.collapsed_title.as_ref(),
                title,
            ])
            .unwrap_or_default(),
            message: pick(&[
                self.fullscreen_description.as_ref(),
                self.expanded_message.as_ref(),
                self.collapsed_message.as_ref(),
                message,
            ])
            .unwrap_or_default(),
            subheading: pick(&[self.fullscreen_subheading.as_ref()]),
            timestamp_text: None,
            show_logo: self.fullscreen_show_logo != Some(false),
            buttons: buttons.into_iter().flatten().collect(),
        }
    }
}

/// A campaign notification as listed for the current user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CampaignNotification {
    #[serde(rename = "user_notification_id")]
    pub id: NotificationId,
    #[serde(default)]
    pub notification_id: Option<NotificationId>,
    #[serde(default)]
    pub type_key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub tiers: CampaignTiers,
}

#[derive(Deserialize, Debug, Default)]
pub struct CampaignListResponse {
    #[serde(default)]
    pub notifications: Vec<CampaignNotification>,
}

pub type CampaignStats = serde_json::Map<String, Value>;

#[derive(Deserialize, Debug, Default)]
pub struct CampaignStatsResponse {
    #[serde(default)]
    pub stats: CampaignStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tiers() -> CampaignTiers {
        serde_json::from_value(json!({
            "collapsed_icon": "🎉",
            "collapsed_title": "Spring sale",
            "collapsed_message": "Up to 40% off",
            "expanded_message": "Up to 40% off on every listing this weekend",
            "expanded_button_1_text": "Shop now",
            "expanded_button_1_action": {"type": "open_screen", "screen": "Search", "params": {"q": "sale"}},
            "expanded_button_2_text": "Later",
            "expanded_button_2_action": {"type": "dismiss"},
            "fullscreen_heading": "The spring sale is on",
            "fullscreen_show_logo": 0,
            "fullscreen_primary_button_text": "Browse",
            "fullscreen_primary_button_action": {"type": "open_url"}
        }))
        .unwrap()
    }

    #[test]
    fn expanded_falls_back_to_collapsed_copy() {
        let view = tiers().expanded(None, None);
        assert_eq!(view.title, "Spring sale");
        assert_eq!(view.message, "Up to 40% off on every listing this weekend");
        assert_eq!(view.icon, "🎉");
        assert_eq!(view.icon_bg_color, EXPANDED_ICON_BG);
        assert_eq!(view.buttons.len(), 2);
        assert_eq!(
            view.button(ButtonSlot::Primary).unwrap().action,
            Some(Action::OpenScreen { screen: "Search".into(), params: json!({"q": "sale"}) })
        );
        assert_eq!(view.button(ButtonSlot::Secondary).unwrap().action, Some(Action::Dismiss));
    }

    #[test]
    fn fullscreen_resolution_and_malformed_button() {
        let view = tiers().fullscreen(None, None);
        assert_eq!(view.title, "The spring sale is on");
        assert_eq!(view.message, "Up to 40% off on every listing this weekend");
        assert!(!view.show_logo);
        let primary = view.button(ButtonSlot::Primary).unwrap();
        assert_eq!(primary.color, PRIMARY_BUTTON_COLOR);
        assert!(primary.action.is_none());
        assert!(view.button(ButtonSlot::Secondary).is_none());
    }

    #[test]
    fn plain_popup_uses_notification_fields() {
        let title = "T".to_string();
        let message = "M".to_string();
        let view = CampaignTiers::default().collapsed(Some(&title), Some(&message));
        assert_eq!(view.title, "T");
        assert_eq!(view.message, "M");
        assert_eq!(view.icon, DEFAULT_ICON);
        assert_eq!(view.icon_bg_color, COLLAPSED_ICON_BG);
        assert!(CampaignTiers::default().fullscreen(None, None).show_logo);
    }
}
