use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use notify_sync::api::{ApiClient, CampaignBackend, NotificationBackend};
use notify_sync::config::Config;
use notify_sync::models::{DeviceRegistration, Platform};

#[derive(Debug, Clone)]
struct Call {
    method: String,
    path: String,
    auth: Option<String>,
}

/// Shared record of what the mock backend received.
#[derive(Clone, Default)]
struct Mock {
    calls: Arc<Mutex<Vec<Call>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl Mock {
    fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| (c.method.clone(), c.path.clone()))
            .collect()
    }
}

async fn record(State(mock): State<Mock>, req: Request, next: Next) -> Response {
    let auth = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.calls.lock().unwrap().push(Call {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        auth,
    });
    next.run(req).await
}

async fn heartbeat(State(mock): State<Mock>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    mock.queries.lock().unwrap().push(query);
    Json(json!({
        "hasNew": true,
        "count": 1,
        "notifications": [{
            "notification_id": 7,
            "user_notification_id": 70,
            "type": "popup",
            "title": "Flash sale",
            "expanded_button_1_text": "Shop",
            "expanded_button_1_action": "{\"type\":\"open_url\",\"url\":\"https://shop.example\"}",
            "fullscreen_show_logo": 0,
            "created_at": "2024-05-01 09:59:00"
        }],
        "lastCheckAt": "2024-05-01T10:00:00Z"
    }))
}

async fn unread_count(req: Request) -> Response {
    if req.headers().get(AUTHORIZATION).is_none() {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    Json(json!({ "unreadCount": 4 })).into_response()
}

async fn list(State(mock): State<Mock>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    mock.queries.lock().unwrap().push(query);
    Json(json!({
        "notifications": [
            {"user_notification_id": 1, "type": "order_update", "is_read": 1, "title": "Shipped"},
            {"user_notification_id": 2, "type": "promo", "is_read": false}
        ]
    }))
}

async fn echo_body(State(mock): State<Mock>, Json(body): Json<Value>) -> Json<Value> {
    mock.bodies.lock().unwrap().push(body);
    Json(json!({ "success": true, "message": "ok" }))
}

async fn ok() -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn delete_one(Path(id): Path<i64>) -> Response {
    if id == 404 {
        return (StatusCode::NOT_FOUND, "no such notification").into_response();
    }
    Json(json!({ "success": true })).into_response()
}

async fn campaigns() -> Json<Value> {
    Json(json!({
        "notifications": [{
            "user_notification_id": 31,
            "notification_id": 3,
            "type_key": "spring_sale",
            "is_read": 0,
            "collapsed_title": "Spring sale"
        }]
    }))
}

async fn campaign_stats() -> Json<Value> {
    Json(json!({ "stats": { "total": 3, "unread": 1 } }))
}

async fn spawn_mock() -> (String, Mock) {
    let mock = Mock::default();
    let app = Router::new()
        .route("/notifications", get(list))
        .route("/notifications/heartbeat", get(heartbeat))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", put(ok))
        .route("/notifications/device-token", post(echo_body).delete(echo_body))
        .route("/notifications/{id}", delete(delete_one))
        .route("/notifications/{id}/read", put(ok))
        .route("/notifications/{id}/clicked", put(ok))
        .route("/campaign-notifications", get(campaigns))
        .route("/campaign-notifications/stats", get(campaign_stats))
        .route("/campaign-notifications/{id}/read", post(ok))
        .route("/campaign-notifications/{id}/click", post(echo_body))
        .route("/campaign-notifications/{id}/dismiss", post(ok))
        .layer(from_fn_with_state(mock.clone(), record))
        .with_state(mock.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/", addr), mock)
}

fn client(base_url: &str, token: Option<&str>) -> ApiClient {
    let mut config = Config::with_api_url(base_url);
    config.access_token = token.map(str::to_string);
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn heartbeat_sends_device_and_last_check() {
    let (url, mock) = spawn_mock().await;
    let api = client(&url, None);

    let response = api.heartbeat("dev-1", Some("2024-05-01T09:00:00Z")).await.unwrap();
    assert!(response.has_new);
    assert_eq!(response.last_check_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    let item = &response.notifications[0];
    assert_eq!(item.notification_id, 7);
    assert!(item.delivery_type().is_popup_eligible());
    assert!(item.created_at.is_some());
    assert_eq!(item.tiers.fullscreen_show_logo, Some(false));

    api.heartbeat("dev-1", None).await.unwrap();

    let queries = mock.queries.lock().unwrap().clone();
    assert_eq!(queries[0].get("deviceId").map(String::as_str), Some("dev-1"));
    assert_eq!(queries[0].get("lastCheck").map(String::as_str), Some("2024-05-01T09:00:00Z"));
    assert!(!queries[1].contains_key("lastCheck"));
    assert_eq!(mock.calls()[0], ("GET".to_string(), "/notifications/heartbeat".to_string()));
}

#[tokio::test]
async fn bearer_token_is_attached_when_signed_in() {
    let (url, mock) = spawn_mock().await;

    let guest = client(&url, None);
    let err = guest.unread_count().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!guest.is_authenticated());

    let api = client(&url, Some("secret"));
    assert!(api.is_authenticated());
    assert_eq!(api.unread_count().await.unwrap(), 4);

    let calls = mock.calls.lock().unwrap().clone();
    assert_eq!(calls[0].auth, None);
    assert_eq!(calls[1].auth.as_deref(), Some("Bearer secret"));

    api.set_access_token(None);
    assert!(!api.is_authenticated());
}

#[tokio::test]
async fn list_and_mutations_hit_expected_paths() {
    let (url, mock) = spawn_mock().await;
    let api = client(&url, Some("secret"));

    let items = api.list_notifications(20, 40).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].is_read);
    assert!(!items[1].is_read);
    let query = mock.queries.lock().unwrap()[0].clone();
    assert_eq!(query.get("limit").map(String::as_str), Some("20"));
    assert_eq!(query.get("offset").map(String::as_str), Some("40"));

    api.mark_read(5).await.unwrap();
    api.mark_clicked(5).await.unwrap();
    api.mark_all_read().await.unwrap();
    api.delete(5).await.unwrap();
    assert_eq!(api.delete(404).await.unwrap_err().status(), Some(404));

    let calls = mock.calls();
    let expected = [
        ("GET", "/notifications"),
        ("PUT", "/notifications/5/read"),
        ("PUT", "/notifications/5/clicked"),
        ("PUT", "/notifications/read-all"),
        ("DELETE", "/notifications/5"),
        ("DELETE", "/notifications/404"),
    ];
    assert_eq!(calls.len(), expected.len());
    for ((method, path), (want_method, want_path)) in calls.iter().zip(expected) {
        assert_eq!(method, want_method);
        assert_eq!(path, want_path);
    }
}

#[tokio::test]
async fn device_token_registration_round_trip() {
    let (url, mock) = spawn_mock().await;
    let api = client(&url, None);

    let ack = api
        .register_device(&DeviceRegistration {
            device_token: "push-abc".into(),
            platform: Platform::Android,
            device_id: "dev-1".into(),
            device_name: Some("Pixel".into()),
        })
        .await
        .unwrap();
    assert!(ack.success);

    api.remove_device_token("push-abc").await.unwrap();

    let bodies = mock.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies[0],
        json!({
            "deviceToken": "push-abc",
            "platform": "android",
            "deviceId": "dev-1",
            "deviceName": "Pixel"
        })
    );
    assert_eq!(bodies[1], json!({ "deviceToken": "push-abc" }));
    assert_eq!(
        mock.calls(),
        vec![
            ("POST".to_string(), "/notifications/device-token".to_string()),
            ("DELETE".to_string(), "/notifications/device-token".to_string()),
        ]
    );
}

#[tokio::test]
async fn campaign_endpoints() {
    let (url, mock) = spawn_mock().await;
    let api = client(&url, Some("secret"));

    let items = api.list_campaigns(10, 0).await.unwrap();
    assert_eq!(items[0].id, 31);
    assert_eq!(items[0].tiers.collapsed_title.as_deref(), Some("Spring sale"));

    api.mark_campaign_read(31).await.unwrap();
    api.mark_campaign_clicked(31, Some("primary")).await.unwrap();
    api.dismiss_campaign(31).await.unwrap();
    let stats = api.campaign_stats().await.unwrap();
    assert_eq!(stats["total"], json!(3));

    assert_eq!(mock.bodies.lock().unwrap()[0], json!({ "button_clicked": "primary" }));
    let paths: Vec<_> = mock.calls().into_iter().map(|(_, p)| p).collect();
    assert_eq!(
        paths,
        vec![
            "/campaign-notifications",
            "/campaign-notifications/31/read",
            "/campaign-notifications/31/click",
            "/campaign-notifications/31/dismiss",
            "/campaign-notifications/stats",
        ]
    );
}
