// src/models/device.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// Platform string for the current build target.
    pub fn current() -> Self {
        #[cfg(target_os = "ios")]
        return Platform::Ios;
        #[cfg(target_os = "android")]
        return Platform::Android;
        #[cfg(target_os = "macos")]
        return Platform::Macos;
        #[cfg(target_os = "windows")]
        return Platform::Windows;
        #[cfg(target_os = "linux")]
        return Platform::Linux;
        #[cfg(not(any(
            target_os = "ios",
            target_os = "android",
            target_os = "macos",
            target_os = "windows",
            target_os = "linux"
        )))]
        return Platform::Web;
    }
}

/// Body of `POST /notifications/device-token`. Idempotent on the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub device_token: String,
    pub platform: Platform,
    pub device_id: String,
    pub device_name: Option<String>,
}

/// Body of `DELETE /notifications/device-token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTokenRemoval {
    pub device_token: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RegistrationAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
