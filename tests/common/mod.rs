#![allow(dead_code)]

use {
    axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    },
    sale_sync::{
        AppState,
        domain::config::{GatewayConfig, GatewayKind, SyncStatus, WebhookToken},
        infra::memory::MemStore,
        router,
    },
    tower::ServiceExt,
    uuid::Uuid,
};

pub const BRAIP_TOKEN: &str = "tok_braip_1";
pub const HOTMART_TOKEN: &str = "tok_hotmart_1";

pub fn braip_config() -> GatewayConfig {
    GatewayConfig {
        id: Uuid::now_v7(),
        tenant_id: Uuid::now_v7(),
        kind: GatewayKind::Braip,
        token: WebhookToken::new(BRAIP_TOKEN).unwrap(),
        is_active: true,
        sync_status: SyncStatus::Pending,
        last_sync: None,
    }
}

/// A config whose gateway has no registered normalizer.
pub fn hotmart_config() -> GatewayConfig {
    GatewayConfig {
        id: Uuid::now_v7(),
        tenant_id: Uuid::now_v7(),
        kind: GatewayKind::Hotmart,
        token: WebhookToken::new(HOTMART_TOKEN).unwrap(),
        is_active: true,
        sync_status: SyncStatus::Pending,
        last_sync: None,
    }
}

pub struct TestApp {
    pub state: AppState<MemStore>,
    pub app: Router,
    pub config: GatewayConfig,
}

/// In-memory app with one active Braip config registered.
pub async fn spawn_app() -> TestApp {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;
    let state = AppState::new(store);
    let app = router(state.clone());
    TestApp { state, app, config }
}

// ── Payload builders ───────────────────────────────────────────────────────

pub fn sale_payload(trans_key: &str, prod_key: &str, value: f64, status_code: i32) -> serde_json::Value {
    serde_json::json!({
        "event": "sale_approved",
        "data": {
            "trans_key": trans_key,
            "prod_key": prod_key,
            "prod_name": "Course",
            "trans_value": value,
            "trans_total_value": value,
            "trans_status": if status_code == 2 { "approved" } else { "pending" },
            "trans_status_code": status_code,
            "trans_payment": 3,
            "cli_name": "Ana",
            "cli_email": "ana@x.com",
            "trans_createdate": "2024-01-01T10:00:00Z",
            "trans_updatedate": "2024-01-01T10:00:00Z"
        }
    })
}

pub fn abandon_payload(prod_key: &str, email: Option<&str>, created: &str) -> serde_json::Value {
    let mut data = serde_json::json!({
        "event": "checkout_abandon",
        "data": {
            "prod_key": prod_key,
            "prod_name": "Course",
            "plan_key": "PL1",
            "plan_name": "Full price",
            "plan_value": 49.9,
            "cli_name": "Ana",
            "created_date": created
        }
    });
    if let Some(email) = email {
        data["data"]["cli_email"] = serde_json::json!(email);
    }
    data
}

// ── HTTP helpers ───────────────────────────────────────────────────────────

pub async fn post_webhook(
    app: &Router,
    gateway: &str,
    token: &str,
    payload: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/webhooks/{gateway}/{token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}
