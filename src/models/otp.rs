use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// OTP 的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpSource {
    /// 短信 webhook 写入的缓存槽（读取即删除）
    Cache,
    /// 邮箱（不会被标记已读，可能被重复读到）
    Mailbox,
}

/// 一次性验证码
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpToken {
    pub code: String,
    pub source: OtpSource,
}

impl OtpToken {
    pub fn new(code: impl Into<String>, source: OtpSource) -> Self {
        Self {
            code: code.into(),
            source,
        }
    }
}

impl fmt::Display for OtpToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// 邮箱返回的一封邮件（正文为纯文本）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub received_at: DateTime<Utc>,
    pub body: String,
}
