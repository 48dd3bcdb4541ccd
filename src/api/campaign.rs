// src/api/campaign.rs
use reqwest::Method;
use serde_json::json;

use crate::api::{ApiClient, CampaignBackend};
use crate::error::Result;
use crate::models::campaign::{CampaignListResponse, CampaignStatsResponse};
use crate::models::{CampaignNotification, CampaignStats, NotificationId};

impl CampaignBackend for ApiClient {
    /// `GET /campaign-notifications?limit&offset`
    async fn list_campaigns(&self, limit: u32, offset: u32) -> Result<Vec<CampaignNotification>> {
        let response: CampaignListResponse = self
            .get_json(
                "/campaign-notifications",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        Ok(response.notifications)
    }

    async fn mark_campaign_read(&self, id: NotificationId) -> Result<()> {
        self.send_empty(Method::POST, &format!("/campaign-notifications/{}/read", id))
            .await
    }

    /// `POST /campaign-notifications/:id/click` with the button that was pressed, if any.
    async fn mark_campaign_clicked(&self, id: NotificationId, button: Option<&str>) -> Result<()> {
        let path = format!("/campaign-notifications/{}/click", id);
        self.send(
            self.request(Method::POST, &path)
                .json(&json!({ "button_clicked": button })),
        )
        .await?;
        Ok(())
    }

    async fn dismiss_campaign(&self, id: NotificationId) -> Result<()> {
        self.send_empty(Method::POST, &format!("/campaign-notifications/{}/dismiss", id))
            .await
    }

    /// `GET /campaign-notifications/stats`
    async fn campaign_stats(&self) -> Result<CampaignStats> {
        let response: CampaignStatsResponse = self.get_json("/campaign-notifications/stats", &[]).await?;
        Ok(response.stats)
    }
}
