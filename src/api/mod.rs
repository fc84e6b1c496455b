//! HTTP 接口
//!
//! 接收短信转发的 webhook，并提供同进程内的 OTP 等待接口

pub mod router;
pub mod sms_webhook;
pub mod state;

pub use router::{create_router, serve};
pub use sms_webhook::WebhookResponse;
pub use state::AppState;
