//! OTP 获取服务 - 业务能力层
//!
//! 在限定时间内轮询：先查缓存槽，再查邮箱，都没有就等一个间隔。
//!
//! 邮箱和缓存的读取错误只记日志，当作"本轮没有"，不会中断轮询；
//! 只有整个时间预算耗尽才返回 [`OtpError::TimedOut`]。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::OtpError;
use crate::infrastructure::{Mailbox, OtpCache, LATEST_OTP_KEY};
use crate::models::{MailMessage, OtpSource, OtpToken};
use crate::services::otp_extractor::OtpExtractor;

/// 轮询参数
#[derive(Debug, Clone)]
pub struct AcquireSettings {
    pub poll_interval: Duration,
    /// 只看这么久以内的邮件
    pub lookback: chrono::Duration,
    /// 发件人域名（包含匹配，不区分大小写）
    pub sender: String,
    pub cache_key: String,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            lookback: chrono::Duration::minutes(10),
            sender: "cipc.co.za".to_string(),
            cache_key: LATEST_OTP_KEY.to_string(),
        }
    }
}

impl AcquireSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.otp_poll_interval(),
            lookback: config.otp_lookback(),
            sender: config.otp_sender.clone(),
            cache_key: LATEST_OTP_KEY.to_string(),
        }
    }
}

/// OTP 获取服务
pub struct OtpAcquirer {
    cache: Arc<dyn OtpCache>,
    mailbox: Arc<dyn Mailbox>,
    extractor: OtpExtractor,
    settings: AcquireSettings,
}

impl OtpAcquirer {
    pub fn new(
        cache: Arc<dyn OtpCache>,
        mailbox: Arc<dyn Mailbox>,
        settings: AcquireSettings,
    ) -> Self {
        Self {
            cache,
            mailbox,
            extractor: OtpExtractor::email(),
            settings,
        }
    }

    pub fn settings(&self) -> &AcquireSettings {
        &self.settings
    }

    /// 在 `timeout` 内获取 OTP
    ///
    /// 等待时长取轮询间隔和剩余时间中较小者，不会超过截止时间一个间隔。
    pub async fn acquire(&self, timeout: Duration) -> Result<OtpToken, OtpError> {
        let start = Instant::now();
        let mut attempt = 0u32;
        info!("🔑 开始获取 OTP (超时 {}s)", timeout.as_secs_f64());

        while start.elapsed() < timeout {
            attempt += 1;
            debug!("第 {} 轮检查", attempt);

            if let Some(token) = self.check_cache().await {
                info!("✓ 从短信缓存取得 OTP (第 {} 轮)", attempt);
                return Ok(token);
            }

            if let Some(token) = self.check_mailbox().await {
                info!("✓ 从邮箱取得 OTP (第 {} 轮)", attempt);
                return Ok(token);
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            sleep(self.settings.poll_interval.min(remaining)).await;
        }

        warn!("⚠️ {} 轮检查后仍未获取到 OTP", attempt);
        Err(OtpError::TimedOut { timeout })
    }

    /// 读取并删除缓存槽中的 OTP
    async fn check_cache(&self) -> Option<OtpToken> {
        match self.cache.take(&self.settings.cache_key).await {
            Ok(code) => code.map(|code| OtpToken::new(code, OtpSource::Cache)),
            Err(e) => {
                warn!("缓存检查失败: {}", e);
                None
            }
        }
    }

    /// 检查邮箱中最新的一封匹配邮件，不修改邮箱状态
    async fn check_mailbox(&self) -> Option<OtpToken> {
        let since = Utc::now() - self.settings.lookback;
        let messages = match self
            .mailbox
            .recent_messages(&self.settings.sender, since)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!("邮箱检查失败: {}", e);
                return None;
            }
        };

        let latest = newest_from_sender(messages, &self.settings.sender, since)?;
        match self.extractor.extract_labeled(&latest.body) {
            Some((code, label)) => {
                debug!("邮件 ({}) 命中规则: {}", latest.from, label);
                Some(OtpToken::new(code, OtpSource::Mailbox))
            }
            None => {
                debug!("最新邮件中没有 OTP: {}", latest.from);
                None
            }
        }
    }
}

/// 按发件人和时间窗口过滤，取最新一封
fn newest_from_sender(
    messages: Vec<MailMessage>,
    sender: &str,
    since: chrono::DateTime<Utc>,
) -> Option<MailMessage> {
    let sender = sender.to_lowercase();
    messages
        .into_iter()
        .filter(|m| m.from.to_lowercase().contains(&sender) && m.received_at >= since)
        .max_by_key(|m| m.received_at)
}
