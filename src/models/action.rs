// src/models/action.rs
use serde_json::{Map, Value};
use tracing::debug;

/// What a notification (or one of its buttons) asks the host app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Dismiss,
    OpenUrl { url: String },
    OpenScreen { screen: String, params: Value },
}

pub const ACTION_DISMISS: &str = "dismiss";
pub const ACTION_OPEN_URL: &str = "open_url";
pub const ACTION_OPEN_SCREEN: &str = "open_screen";

impl Action {
    /// Parse a campaign button action: `{"type": "...", "url"?, "screen"?, "params"?}`.
    /// The object may also arrive JSON-encoded inside a string.
    pub fn from_button(value: &Value) -> Option<Self> {
        let object = as_object(value)?;
        let action_type = object.get("type").and_then(Value::as_str)?;
        Self::build(action_type, &object)
    }

    /// Parse the `(action_type, action_data)` pair carried by transactional notifications.
    pub fn from_parts(action_type: &str, action_data: Option<&Value>) -> Option<Self> {
        if action_type == ACTION_DISMISS {
            return Some(Action::Dismiss);
        }
        let object = as_object(action_data?)?;
        Self::build(action_type, &object)
    }

    fn build(action_type: &str, data: &Map<String, Value>) -> Option<Self> {
        let non_empty = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let action = match action_type {
            ACTION_DISMISS => Some(Action::Dismiss),
            ACTION_OPEN_URL => non_empty("url").map(|url| Action::OpenUrl { url }),
            ACTION_OPEN_SCREEN => non_empty("screen").map(|screen| Action::OpenScreen {
                screen,
                params: data
                    .get("params")
                    .cloned()
                    .filter(|p| !p.is_null())
                    .unwrap_or_else(|| Value::Object(Map::new())),
            }),
            _ => None,
        };

        if action.is_none() {
            debug!(action_type, "ignoring malformed notification action");
        }
        action
    }
}

fn as_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_button_actions() {
        assert_eq!(Action::from_button(&json!({"type": "dismiss"})), Some(Action::Dismiss));
        assert_eq!(
            Action::from_button(&json!({"type": "open_url", "url": "https://example.com"})),
            Some(Action::OpenUrl { url: "https://example.com".into() })
        );
        assert_eq!(
            Action::from_button(&json!({"type": "open_screen", "screen": "Wallet", "params": {"tab": 2}})),
            Some(Action::OpenScreen { screen: "Wallet".into(), params: json!({"tab": 2}) })
        );
    }

    #[test]
    fn malformed_actions_are_ignored() {
        assert_eq!(Action::from_button(&json!({"type": "open_url"})), None);
        assert_eq!(Action::from_button(&json!({"type": "open_screen", "screen": ""})), None);
        assert_eq!(Action::from_button(&json!({"type": "teleport"})), None);
        assert_eq!(Action::from_button(&json!("not json")), None);
        assert_eq!(Action::from_parts("open_screen", None), None);
    }

    #[test]
    fn action_data_may_be_a_json_string() {
        let data = json!("{\"screen\":\"Offers\"}");
        assert_eq!(
            Action::from_parts("open_screen", Some(&data)),
            Some(Action::OpenScreen { screen: "Offers".into(), params: json!({}) })
        );
    }
}
