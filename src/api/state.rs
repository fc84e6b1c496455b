//! HTTP 处理函数共享的状态

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::infrastructure::{Mailbox, OtpCache, LATEST_OTP_KEY};
use crate::services::{AcquireSettings, OtpAcquirer, OtpExtractor};

/// 应用状态
///
/// 缓存槽由 webhook 写入、由同进程内的 [`OtpAcquirer`] 读取。
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn OtpCache>,
    pub acquirer: Arc<OtpAcquirer>,
    pub sms_extractor: OtpExtractor,
    /// 缓存槽键名
    pub cache_key: String,
    /// 短信 OTP 的有效期
    pub cache_ttl: Duration,
    /// `/otp` 未指定超时时使用，同时也是上限
    pub max_wait: Duration,
}

impl AppState {
    pub fn new(config: &Config, cache: Arc<dyn OtpCache>, mailbox: Arc<dyn Mailbox>) -> Self {
        let acquirer = OtpAcquirer::new(
            cache.clone(),
            mailbox,
            AcquireSettings::from_config(config),
        );
        Self {
            cache,
            acquirer: Arc::new(acquirer),
            sms_extractor: OtpExtractor::sms(),
            cache_key: LATEST_OTP_KEY.to_string(),
            cache_ttl: config.otp_cache_ttl(),
            max_wait: config.otp_timeout(),
        }
    }
}
