// src/coordinator/campaign.rs
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::CampaignBackend;
use crate::error::Result;
use crate::models::{ButtonSlot, CampaignNotification, CampaignStats, NotificationId};
use crate::popup::PopupNotification;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignState {
    pub items: Vec<CampaignNotification>,
    pub loading: bool,
}

/// Label sent to the backend for the pressed button.
pub fn button_label(slot: ButtonSlot) -> &'static str {
    match slot {
        ButtonSlot::Primary => "primary",
        ButtonSlot::Secondary => "secondary",
    }
}

/// ✅ **Campaign notification feed**
///
/// Marketing/lifecycle notifications with three-tier presentation. Read and dismiss are
/// applied locally before the backend confirms.
pub struct CampaignFeed<C> {
    backend: Arc<C>,
    state: watch::Sender<CampaignState>,
}

impl<C: CampaignBackend> CampaignFeed<C> {
    pub fn new(backend: Arc<C>) -> Self {
        let (state, _) = watch::channel(CampaignState::default());
        Self { backend, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<CampaignState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CampaignState {
        self.state.borrow().clone()
    }

    pub async fn fetch(&self, limit: u32, offset: u32) -> Result<Vec<CampaignNotification>> {
        self.state.send_modify(|s| s.loading = true);
        let result = self.backend.list_campaigns(limit, offset).await;

        self.state.send_modify(|s| {
            s.loading = false;
            if let Ok(items) = &result {
                if offset == 0 {
                    s.items = items.clone();
                } else {
                    for item in items {
                        if !s.items.iter().any(|c| c.id == item.id) {
                            s.items.push(item.clone());
                        }
                    }
                }
            }
        });

        if let Err(e) = &result {
            warn!(error = %e, "failed to fetch campaign notifications");
        }
        result
    }

    pub async fn mark_read(&self, id: NotificationId) -> Result<()> {
        self.state.send_if_modified(|s| match s.items.iter_mut().find(|c| c.id == id) {
            Some(c) if !c.is_read => {
                c.is_read = true;
                true
            }
            _ => false,
        });

        let result = self.backend.mark_campaign_read(id).await;
        if let Err(e) = &result {
            warn!(campaign_id = id, error = %e, "failed to mark campaign as read");
        }
        result
    }

    pub async fn mark_clicked(&self, id: NotificationId, button: Option<ButtonSlot>) -> Result<()> {
        let result = self
            .backend
            .mark_campaign_clicked(id, button.map(button_label))
            .await;
        if let Err(e) = &result {
            warn!(campaign_id = id, error = %e, "failed to record campaign click");
        }
        result
    }

    pub async fn dismiss(&self, id: NotificationId) -> Result<()> {
        self.state.send_if_modified(|s| {
            let before = s.items.len();
            s.items.retain(|c| c.id != id);
            s.items.len() != before
        });

        let result = self.backend.dismiss_campaign(id).await;
        if let Err(e) = &result {
            warn!(campaign_id = id, error = %e, "failed to dismiss campaign");
        }
        result
    }

    pub async fn stats(&self) -> Result<CampaignStats> {
        let stats = self.backend.campaign_stats().await?;
        debug!(keys = stats.len(), "campaign stats loaded");
        Ok(stats)
    }

    /// Popup for a loaded campaign, starting collapsed when handed to the coordinator.
    pub fn popup_for(&self, id: NotificationId) -> Option<PopupNotification> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|c| c.id == id)
            .map(PopupNotification::from)
    }
}
