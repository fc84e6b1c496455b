//! 短信 webhook
//!
//! 短信转发服务把收到的短信 POST 过来，正文在 `Body` 字段里
//! （JSON 或表单编码都接受）。找到 6 位验证码就写入缓存槽。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
struct SmsPayload {
    #[serde(rename = "Body")]
    body: Option<String>,
}

/// webhook 响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookResponse {
    Success { otp: String },
    NoOtpFound,
    Error { message: String },
}

/// POST /sms-webhook
pub async fn sms_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    let text = message_text(&headers, &body);
    debug!("收到短信: {}", text);

    let Some(otp) = state.sms_extractor.extract(&text) else {
        info!("📨 短信中没有验证码");
        return (StatusCode::OK, Json(WebhookResponse::NoOtpFound));
    };

    match state.cache.put(&state.cache_key, &otp, state.cache_ttl).await {
        Ok(()) => {
            info!("📨 OTP 已缓存: {} (有效期 {}s)", otp, state.cache_ttl.as_secs());
            (StatusCode::OK, Json(WebhookResponse::Success { otp }))
        }
        Err(e) => {
            error!("❌ OTP 写入缓存失败: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(WebhookResponse::Error {
                    message: e.to_string(),
                }),
            )
        }
    }
}

/// 取出短信正文；字段缺失或请求体无法解析时视为空文本
fn message_text(headers: &HeaderMap, body: &[u8]) -> String {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false);

    if is_form {
        url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "Body")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    } else {
        serde_json::from_slice::<SmsPayload>(body)
            .ok()
            .and_then(|payload| payload.body)
            .unwrap_or_default()
    }
}
