//! Client-side projection of the inbox into tabs and filter chips.

use std::fmt;
use std::str::FromStr;

use crate::models::Notification;

/// UI bucket a notification `type` maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Buyer,
    Seller,
    Promo,
    Reco,
    Chat,
}

const BUYER_TYPES: &[&str] = &["buyer_message", "buyer_offer", "order_confirmed"];
const SELLER_TYPES: &[&str] = &["seller_message", "payment_received", "seller_reward"];
const PROMO_TYPES: &[&str] = &["promo", "limited_offer", "discount"];
const RECO_TYPES: &[&str] = &["recommendation", "location_tip", "feature_tip"];
const CHAT_TYPES: &[&str] = &[
    "new_message",
    "offer_received",
    "offer_accepted",
    "offer_rejected",
    "offer_counter",
];

impl Category {
    pub fn of(type_field: &str) -> Option<Category> {
        [
            (Category::Buyer, BUYER_TYPES),
            (Category::Seller, SELLER_TYPES),
            (Category::Promo, PROMO_TYPES),
            (Category::Reco, RECO_TYPES),
            (Category::Chat, CHAT_TYPES),
        ]
        .into_iter()
        .find(|(_, types)| types.contains(&type_field))
        .map(|(category, _)| category)
    }

    pub fn types(self) -> &'static [&'static str] {
        match self {
            Category::Buyer => BUYER_TYPES,
            Category::Seller => SELLER_TYPES,
            Category::Promo => PROMO_TYPES,
            Category::Reco => RECO_TYPES,
            Category::Chat => CHAT_TYPES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Notifications,
    Chat,
}

/// Filter chips shown on the notifications tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterLabel {
    #[default]
    All,
    Buyer,
    Seller,
    Promo,
    Reco,
}

impl FilterLabel {
    pub const ALL: [FilterLabel; 5] = [
        FilterLabel::All,
        FilterLabel::Buyer,
        FilterLabel::Seller,
        FilterLabel::Promo,
        FilterLabel::Reco,
    ];

    pub fn category(self) -> Option<Category> {
        match self {
            FilterLabel::All => None,
            FilterLabel::Buyer => Some(Category::Buyer),
            FilterLabel::Seller => Some(Category::Seller),
            FilterLabel::Promo => Some(Category::Promo),
            FilterLabel::Reco => Some(Category::Reco),
        }
    }
}

impl fmt::Display for FilterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FilterLabel::All => "All",
            FilterLabel::Buyer => "Buyer",
            FilterLabel::Seller => "Seller",
            FilterLabel::Promo => "Promo",
            FilterLabel::Reco => "Reco",
        };
        f.write_str(label)
    }
}

impl FromStr for FilterLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterLabel::ALL
            .into_iter()
            .find(|label| label.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter label: {}", s))
    }
}

/// Items visible under `tab` with `label` selected, in their original order.
///
/// The chat tab shows chat types only and ignores `label`. The notifications tab
/// hides chat types and then narrows to the label's bucket.
pub fn filter_notifications<'a>(
    items: &'a [Notification],
    tab: Tab,
    label: FilterLabel,
) -> Vec<&'a Notification> {
    items
        .iter()
        .filter(|n| {
            let category = Category::of(&n.type_field);
            match tab {
                Tab::Chat => category == Some(Category::Chat),
                Tab::Notifications => {
                    category != Some(Category::Chat)
                        && label.category().map_or(true, |wanted| category == Some(wanted))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: i64, type_field: &str) -> Notification {
        serde_json::from_value(serde_json::json!({
            "user_notification_id": id,
            "type": type_field,
        }))
        .unwrap()
    }

    fn inbox() -> Vec<Notification> {
        vec![
            notification(1, "buyer_offer"),
            notification(2, "new_message"),
            notification(3, "promo"),
            notification(4, "system_announcement"),
            notification(5, "seller_reward"),
            notification(6, "offer_counter"),
            notification(7, "discount"),
        ]
    }

    fn ids(items: Vec<&Notification>) -> Vec<i64> {
        items.into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn chat_tab_shows_only_chat_types() {
        let items = inbox();
        assert_eq!(ids(filter_notifications(&items, Tab::Chat, FilterLabel::All)), vec![2, 6]);
        assert_eq!(ids(filter_notifications(&items, Tab::Chat, FilterLabel::Promo)), vec![2, 6]);
    }

    #[test]
    fn notifications_tab_excludes_chat_and_applies_label() {
        let items = inbox();
        assert_eq!(
            ids(filter_notifications(&items, Tab::Notifications, FilterLabel::All)),
            vec![1, 3, 4, 5, 7]
        );
        assert_eq!(ids(filter_notifications(&items, Tab::Notifications, FilterLabel::Promo)), vec![3, 7]);
        assert_eq!(ids(filter_notifications(&items, Tab::Notifications, FilterLabel::Buyer)), vec![1]);
        assert!(filter_notifications(&items, Tab::Notifications, FilterLabel::Reco).is_empty());
    }

    #[test]
    fn projection_is_deterministic() {
        let items = inbox();
        for label in FilterLabel::ALL {
            let first = ids(filter_notifications(&items, Tab::Notifications, label));
            let second = ids(filter_notifications(&items, Tab::Notifications, label));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("promo".parse::<FilterLabel>(), Ok(FilterLabel::Promo));
        assert_eq!("All".parse::<FilterLabel>(), Ok(FilterLabel::All));
        assert!("Chat".parse::<FilterLabel>().is_err());
        assert_eq!(Category::of("feature_tip"), Some(Category::Reco));
        assert_eq!(Category::of("unknown"), None);
    }
}
