// src/api/notification.rs
use reqwest::Method;

use crate::api::{ApiClient, NotificationBackend};
use crate::error::Result;
use crate::models::device::DeviceTokenRemoval;
use crate::models::notification::{NotificationListResponse, UnreadCountResponse};
use crate::models::{DeviceRegistration, HeartbeatResponse, Notification, NotificationId, RegistrationAck};

impl NotificationBackend for ApiClient {
    /// `POST /notifications/device-token` (works for guests too)
    async fn register_device(&self, registration: &DeviceRegistration) -> Result<RegistrationAck> {
        self.send_json(Method::POST, "/notifications/device-token", registration)
            .await
    }

    /// `DELETE /notifications/device-token` (logout)
    async fn remove_device_token(&self, device_token: &str) -> Result<()> {
        let body = DeviceTokenRemoval {
            device_token: device_token.to_string(),
        };
        self.send(
            self.request(Method::DELETE, "/notifications/device-token")
                .json(&body),
        )
        .await?;
        Ok(())
    }

    /// `GET /notifications?limit&offset`
    async fn list_notifications(&self, limit: u32, offset: u32) -> Result<Vec<Notification>> {
        let response: NotificationListResponse = self
            .get_json(
                "/notifications",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        Ok(response.notifications)
    }

    /// `GET /notifications/unread-count`
    async fn unread_count(&self) -> Result<u64> {
        let response: UnreadCountResponse = self.get_json("/notifications/unread-count", &[]).await?;
        Ok(response.unread_count)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<()> {
        self.send_empty(Method::PUT, &format!("/notifications/{}/read", id))
            .await
    }

    async fn mark_clicked(&self, id: NotificationId) -> Result<()> {
        self.send_empty(Method::PUT, &format!("/notifications/{}/clicked", id))
            .await
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.send_empty(Method::PUT, "/notifications/read-all").await
    }

    async fn delete(&self, id: NotificationId) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/notifications/{}", id))
            .await
    }

    /// `GET /notifications/heartbeat?deviceId&lastCheck`; each parameter only when present.
    async fn heartbeat(&self, device_id: &str, last_check: Option<&str>) -> Result<HeartbeatResponse> {
        let mut query = Vec::with_capacity(2);
        if !device_id.is_empty() {
            query.push(("deviceId", device_id.to_string()));
        }
        if let Some(last_check) = last_check {
            query.push(("lastCheck", last_check.to_string()));
        }
        self.get_json("/notifications/heartbeat", &query).await
    }

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}
