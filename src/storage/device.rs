//! Locally generated device identity used for guest tracking and heartbeats.

use std::sync::{Arc, OnceLock};

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::KeyValueStore;

pub const DEVICE_ID_KEY: &str = "device_id";
pub const PUSH_TOKEN_KEY: &str = "push_token";

pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
    device_id: OnceLock<String>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            device_id: OnceLock::new(),
        }
    }

    /// Stored device id, generating and persisting a UUID v4 on first use.
    pub fn device_id(&self) -> Result<String> {
        if let Some(id) = self.device_id.get() {
            return Ok(id.clone());
        }

        let id = match self.store.get(DEVICE_ID_KEY)? {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = Uuid::new_v4().to_string();
                self.store.set(DEVICE_ID_KEY, &id)?;
                info!(device_id = %id, "generated new device id");
                id
            }
        };

        Ok(self.device_id.get_or_init(|| id).clone())
    }

    /// Push token from the last successful registration.
    pub fn push_token(&self) -> Result<Option<String>> {
        self.store.get(PUSH_TOKEN_KEY)
    }

    pub fn remember_push_token(&self, token: &str) -> Result<()> {
        self.store.set(PUSH_TOKEN_KEY, token)
    }

    pub fn forget_push_token(&self) -> Result<()> {
        self.store.remove(PUSH_TOKEN_KEY)
    }
}
