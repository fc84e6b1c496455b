use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 命令入口返回的错误，按来源包装各类具体错误。
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    #[error("OTP 错误: {0}")]
    Otp(#[from] OtpError),
    #[error("邮箱错误: {0}")]
    Mailbox(#[from] MailboxError),
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),
    /// 监听端口或 HTTP 服务异常
    #[error("服务错误: {0}")]
    Server(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填项缺失
    #[error("缺少必填配置 {field} (环境变量 {var_name})")]
    MissingValue {
        field: &'static str,
        var_name: &'static str,
    },
    /// 取值超出允许范围
    #[error("配置 {var_name} 的值 '{value}' 无效: {reason}")]
    InvalidValue {
        var_name: &'static str,
        value: String,
        reason: &'static str,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// OTP 获取错误
///
/// 超时单独成一类，调用方可以区分"还没收到"和"出故障了"。
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("在 {}s 内未收到 OTP", .timeout.as_secs_f64())]
    TimedOut { timeout: Duration },
}

/// 邮箱访问错误
#[derive(Debug, Error)]
pub enum MailboxError {
    /// 建立 TLS 连接失败
    #[error("无法连接到邮件服务器 {server}:{port}: {reason}")]
    Connect {
        server: String,
        port: u16,
        reason: String,
    },
    /// 登录失败
    #[error("邮箱登录失败 ({username}): {reason}")]
    Login { username: String, reason: String },
    /// IMAP 协议错误
    #[error("IMAP 操作失败: {0}")]
    Protocol(#[from] imap::Error),
    /// 邮件解析失败
    #[error("邮件解析失败: {0}")]
    Parse(#[from] mailparse::MailParseError),
    /// 后台任务失败
    #[error("邮箱任务异常退出: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("缓存不可用: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_app_error_keeps_source() {
        let err = AppError::from(ConfigError::MissingValue {
            field: "imap_username",
            var_name: "IMAP_USERNAME",
        });

        assert!(err.to_string().starts_with("配置错误"));
        let source = err.source().expect("应保留原始错误");
        assert!(source.to_string().contains("IMAP_USERNAME"));
    }

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = AppError::from(OtpError::TimedOut {
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(err, AppError::Otp(OtpError::TimedOut { .. })));
        assert!(err.to_string().contains("5s"));
    }
}
