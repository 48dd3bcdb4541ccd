use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use notify_sync::api::ApiClient;
use notify_sync::config::Config;
use notify_sync::coordinator::{CoordinatorSettings, NotificationCoordinator, NotificationState};
use notify_sync::storage::{DeviceIdentity, FileStore};
use notify_sync::utils::time::format_relative;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    Config::init()?;
    let config = Config::get().context("config not initialized")?;
    let _guard = init_tracing(&config)?;

    let client = Arc::new(ApiClient::new(&config)?);
    let identity = DeviceIdentity::new(Arc::new(FileStore::new(config.storage_path.clone())));
    info!(
        api_url = client.base_url(),
        device_id = %identity.device_id()?,
        authenticated = client.access_token().is_some(),
        "🚀 notify-sync starting"
    );

    let coordinator = NotificationCoordinator::new(
        client.clone(),
        identity,
        CoordinatorSettings::from(config.as_ref()),
    );
    coordinator.start();

    if client.access_token().is_some() {
        if let Ok(items) = coordinator.fetch_notifications(config.page_size, 0).await {
            info!(count = items.len(), "inbox loaded");
        }
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let reporter = tokio::spawn(report_changes(coordinator.subscribe(), shutdown_tx.subscribe()));

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    coordinator.stop().await;
    if let Err(e) = reporter.await {
        warn!(error = %e, "state reporter ended abnormally");
    }
    info!("✅ notify-sync stopped");
    Ok(())
}

fn init_tracing(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "notify-sync.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => warn!(error = %e, "failed to listen for Ctrl+C, shutting down"),
    }
}

/// Logs badge and popup changes as the store publishes them.
async fn report_changes(
    mut state_rx: watch::Receiver<NotificationState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut last_unread = None;
    let mut last_popup = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let state = state_rx.borrow_and_update().clone();

        if last_unread != Some(state.unread_count) {
            info!(unread = state.unread_count, "🔔 unread count");
            last_unread = Some(state.unread_count);
        }

        let popup_id = state.popup.as_ref().map(|p| p.notification.id);
        if popup_id != last_popup {
            if let Some(view) = state.popup.as_ref().and_then(|p| p.view()) {
                info!(
                    notification_id = ?popup_id,
                    icon = %view.icon,
                    title = %view.title,
                    message = %view.message,
                    "📣 popup"
                );
            }
            last_popup = popup_id;
        }

        if let Some(newest) = state.notifications.first() {
            if let Some(created_at) = newest.created_at {
                tracing::debug!(
                    newest = newest.id,
                    age = %format_relative(created_at, chrono::Utc::now()),
                    "inbox head"
                );
            }
        }
    }
}
