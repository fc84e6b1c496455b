//! 路由和服务启动

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::sms_webhook::sms_webhook;
use crate::api::state::AppState;
use crate::models::OtpSource;

/// 创建路由
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sms-webhook", post(sms_webhook))
        .route("/otp", get(wait_for_otp))
        .route("/health", get(health))
        .with_state(state)
}

/// 启动 HTTP 服务，直到进程退出
pub async fn serve(port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("🚀 Webhook 服务已启动: http://{}", addr);
    info!("📱 短信 webhook: http://{}/sms-webhook", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "live", "timestamp": Utc::now() }))
}

#[derive(Debug, Deserialize)]
pub struct OtpQuery {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OtpResponse {
    Success { otp: String, source: OtpSource },
    Timeout { waited_secs: u64 },
}

/// GET /otp?timeout_secs=N
///
/// 在本进程内等待 OTP，超时时间不超过配置的上限。
async fn wait_for_otp(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OtpQuery>,
) -> (StatusCode, Json<OtpResponse>) {
    let timeout = query
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(state.max_wait)
        .min(state.max_wait);

    match state.acquirer.acquire(timeout).await {
        Ok(token) => (
            StatusCode::OK,
            Json(OtpResponse::Success {
                otp: token.code,
                source: token.source,
            }),
        ),
        Err(_) => (
            StatusCode::REQUEST_TIMEOUT,
            Json(OtpResponse::Timeout {
                waited_secs: timeout.as_secs(),
            }),
        ),
    }
}
