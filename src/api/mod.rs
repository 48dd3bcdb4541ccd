//! Backend REST surface consumed by the app.

pub mod campaign;
pub mod notification;

use std::future::Future;
use std::sync::RwLock;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{NotificationError, Result};
use crate::models::{
    CampaignNotification, CampaignStats, DeviceRegistration, HeartbeatResponse, Notification,
    NotificationId, RegistrationAck,
};

/// Everything the coordinator needs from the notifications backend.
pub trait NotificationBackend: Send + Sync + 'static {
    fn register_device(
        &self,
        registration: &DeviceRegistration,
    ) -> impl Future<Output = Result<RegistrationAck>> + Send;

    fn remove_device_token(&self, device_token: &str) -> impl Future<Output = Result<()>> + Send;

    fn list_notifications(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<Notification>>> + Send;

    fn unread_count(&self) -> impl Future<Output = Result<u64>> + Send;

    fn mark_read(&self, id: NotificationId) -> impl Future<Output = Result<()>> + Send;

    fn mark_clicked(&self, id: NotificationId) -> impl Future<Output = Result<()>> + Send;

    fn mark_all_read(&self) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, id: NotificationId) -> impl Future<Output = Result<()>> + Send;

    fn heartbeat(
        &self,
        device_id: &str,
        last_check: Option<&str>,
    ) -> impl Future<Output = Result<HeartbeatResponse>> + Send;

    /// Whether authenticated endpoints can be called at all.
    fn is_authenticated(&self) -> bool;
}

/// Campaign (marketing/lifecycle) endpoints.
pub trait CampaignBackend: Send + Sync + 'static {
    fn list_campaigns(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<CampaignNotification>>> + Send;

    fn mark_campaign_read(&self, id: NotificationId) -> impl Future<Output = Result<()>> + Send;

    fn mark_campaign_clicked(
        &self,
        id: NotificationId,
        button: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn dismiss_campaign(&self, id: NotificationId) -> impl Future<Output = Result<()>> + Send;

    fn campaign_stats(&self) -> impl Future<Output = Result<CampaignStats>> + Send;
}

/// HTTP client for the mobile-app API.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: RwLock::new(config.access_token.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Swap the bearer token (login / logout / refresh).
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.access_token.write() {
            *current = token;
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|t| t.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        match self.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Vec<u8>> {
        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(NotificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let body = self.send(self.request(Method::GET, path).query(query)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = self.send(self.request(method, path).json(body)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fire a request whose response body we do not care about.
    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        self.send(self.request(method, path)).await?;
        Ok(())
    }
}
