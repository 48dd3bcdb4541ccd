use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::error::{NotificationError, Result};

/// ✅ Global Config stored in `OnceLock`
static CONFIG: OnceLock<Arc<Config>> = OnceLock::new();

pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub access_token: Option<String>,
    pub push_token: Option<String>,
    pub heartbeat_interval: Duration,
    pub request_timeout: Duration,
    pub storage_path: PathBuf,
    pub device_name: String,
    pub page_size: u32,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// ✅ Load environment variables and set defaults
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env only once

        let api_url = env::var("NOTIFY_API_URL")
            .map_err(|_| NotificationError::Config("NOTIFY_API_URL must be set".to_string()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: non_empty_var("NOTIFY_ACCESS_TOKEN"),
            push_token: non_empty_var("NOTIFY_PUSH_TOKEN"),
            heartbeat_interval: Duration::from_secs(parse_var(
                "NOTIFY_HEARTBEAT_SECS",
                DEFAULT_HEARTBEAT_SECS,
            )?),
            request_timeout: Duration::from_secs(parse_var(
                "NOTIFY_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            storage_path: PathBuf::from(
                env::var("NOTIFY_STORAGE_PATH").unwrap_or_else(|_| "notify-sync.json".to_string()),
            ),
            device_name: non_empty_var("NOTIFY_DEVICE_NAME").unwrap_or_else(default_device_name),
            page_size: parse_var("NOTIFY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            log_dir: non_empty_var("NOTIFY_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Config pointing at `api_url` with every other field defaulted. Handy for tests and embedding.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: None,
            push_token: None,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            storage_path: PathBuf::from("notify-sync.json"),
            device_name: default_device_name(),
            page_size: DEFAULT_PAGE_SIZE,
            log_dir: None,
        }
    }

    /// ✅ Initialize the global config
    pub fn init() -> Result<()> {
        let config = Self::from_env()?;
        CONFIG
            .set(Arc::new(config))
            .map_err(|_| NotificationError::Config("Config already initialized".to_string()))
    }

    /// ✅ Safe access to Config
    pub fn get() -> Option<Arc<Config>> {
        CONFIG.get().cloned()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| NotificationError::Config(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(default),
    }
}

fn default_device_name() -> String {
    env::var("HOSTNAME")
        .or_else(|_| env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown device".to_string())
}
