use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 演示模式下使用的占位账号
const DEMO_USERNAME: &str = "demo_user";
const DEMO_PASSWORD: &str = "demo_pass";

/// 邮件回看窗口上限（30 天）
const MAX_LOOKBACK_MINUTES: i64 = 30 * 24 * 60;
/// 短信 OTP 有效期上限（1 天）
const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 演示模式：允许使用占位账号
    pub demo_mode: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- 申报门户配置 ---
    pub filing_username: String,
    pub filing_password: String,
    /// 申报门户地址，各业务路径拼接在其后
    pub portal_url: String,
    /// 浏览器可执行文件路径（为空时自动探测）
    pub chrome_executable: Option<String>,
    pub headless: bool,

    // --- 邮箱配置 ---
    pub imap_server: String,
    pub imap_port: u16,
    pub imap_username: String,
    pub imap_password: String,

    // --- OTP 配置 ---
    /// 发件人域名过滤
    pub otp_sender: String,
    pub otp_lookback_minutes: i64,
    pub otp_poll_interval_secs: u64,
    pub otp_timeout_secs: u64,
    pub otp_cache_ttl_secs: u64,

    // --- Webhook 服务 ---
    pub webhook_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            demo_mode: false,
            verbose_logging: false,
            filing_username: String::new(),
            filing_password: String::new(),
            portal_url: "https://httpbin.org".to_string(),
            chrome_executable: None,
            headless: true,
            imap_server: "imap.gmail.com".to_string(),
            imap_port: 993,
            imap_username: String::new(),
            imap_password: String::new(),
            otp_sender: "cipc.co.za".to_string(),
            otp_lookback_minutes: 10,
            otp_poll_interval_secs: 10,
            otp_timeout_secs: 300,
            otp_cache_ttl_secs: 300,
            webhook_port: 5000,
        }
    }
}

impl Config {
    /// 从默认值、可选的 TOML 文件和环境变量加载配置
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        base.merge_env(|name| std::env::var(name).ok())
    }

    /// 只从环境变量加载（不读取配置文件）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env(|name| std::env::var(name).ok())
    }

    /// 读取 TOML 配置文件，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: display,
            source,
        })
    }

    /// 用环境变量覆盖已有配置
    ///
    /// `lookup` 方便测试时注入变量表。
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CIPC_DEMO_MODE") {
            self.demo_mode = parse_var("CIPC_DEMO_MODE", &v, "bool")?;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("CIPC_USERNAME") {
            self.filing_username = v;
        }
        if let Some(v) = lookup("CIPC_PASSWORD") {
            self.filing_password = v;
        }
        if let Some(v) = lookup("CIPC_PORTAL_URL") {
            self.portal_url = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("BROWSER_HEADLESS") {
            self.headless = parse_var("BROWSER_HEADLESS", &v, "bool")?;
        }
        if let Some(v) = lookup("IMAP_SERVER") {
            self.imap_server = v;
        }
        if let Some(v) = lookup("IMAP_PORT") {
            self.imap_port = parse_var("IMAP_PORT", &v, "u16")?;
        }
        if let Some(v) = lookup("IMAP_USERNAME") {
            self.imap_username = v;
        }
        if let Some(v) = lookup("IMAP_PASSWORD") {
            self.imap_password = v;
        }
        if let Some(v) = lookup("OTP_SENDER") {
            self.otp_sender = v;
        }
        if let Some(v) = lookup("OTP_LOOKBACK_MINUTES") {
            self.otp_lookback_minutes = parse_var("OTP_LOOKBACK_MINUTES", &v, "i64")?;
        }
        if let Some(v) = lookup("OTP_POLL_INTERVAL_SECS") {
            self.otp_poll_interval_secs = parse_var("OTP_POLL_INTERVAL_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("OTP_TIMEOUT_SECS") {
            self.otp_timeout_secs = parse_var("OTP_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("OTP_CACHE_TTL_SECS") {
            self.otp_cache_ttl_secs = parse_var("OTP_CACHE_TTL_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("WEBHOOK_PORT") {
            self.webhook_port = parse_var("WEBHOOK_PORT", &v, "u16")?;
        }
        Ok(self)
    }

    /// 校验申报门户账号
    ///
    /// 演示模式下空账号会被填上占位值，其余情况必须显式提供。
    pub fn validate_filing(&mut self) -> Result<(), ConfigError> {
        if self.demo_mode {
            if self.filing_username.is_empty() {
                self.filing_username = DEMO_USERNAME.to_string();
            }
            if self.filing_password.is_empty() {
                self.filing_password = DEMO_PASSWORD.to_string();
            }
            return Ok(());
        }
        if self.filing_username.is_empty() {
            return Err(ConfigError::MissingValue {
                field: "filing_username",
                var_name: "CIPC_USERNAME",
            });
        }
        if self.filing_password.is_empty() {
            return Err(ConfigError::MissingValue {
                field: "filing_password",
                var_name: "CIPC_PASSWORD",
            });
        }
        Ok(())
    }

    /// 校验邮箱账号（没有占位值可用）
    pub fn validate_mailbox(&self) -> Result<(), ConfigError> {
        if self.imap_username.is_empty() {
            return Err(ConfigError::MissingValue {
                field: "imap_username",
                var_name: "IMAP_USERNAME",
            });
        }
        if self.imap_password.is_empty() {
            return Err(ConfigError::MissingValue {
                field: "imap_password",
                var_name: "IMAP_PASSWORD",
            });
        }
        Ok(())
    }

    /// 校验 OTP 轮询参数
    pub fn validate_otp(&self) -> Result<(), ConfigError> {
        let lookback_ok = chrono::Duration::try_minutes(self.otp_lookback_minutes)
            .is_some_and(|d| {
                d > chrono::Duration::zero() && d.num_minutes() <= MAX_LOOKBACK_MINUTES
            });
        if !lookback_ok {
            return Err(ConfigError::InvalidValue {
                var_name: "OTP_LOOKBACK_MINUTES",
                value: self.otp_lookback_minutes.to_string(),
                reason: "必须在 1 到 43200 分钟之间",
            });
        }
        if self.otp_poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "OTP_POLL_INTERVAL_SECS",
                value: self.otp_poll_interval_secs.to_string(),
                reason: "轮询间隔必须大于 0",
            });
        }
        if self.otp_cache_ttl_secs == 0 || self.otp_cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                var_name: "OTP_CACHE_TTL_SECS",
                value: self.otp_cache_ttl_secs.to_string(),
                reason: "必须在 1 到 86400 秒之间",
            });
        }
        Ok(())
    }

    pub fn otp_poll_interval(&self) -> Duration {
        Duration::from_secs(self.otp_poll_interval_secs)
    }

    pub fn otp_timeout(&self) -> Duration {
        Duration::from_secs(self.otp_timeout_secs)
    }

    pub fn otp_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_cache_ttl_secs)
    }

    /// 回看窗口，未校验的值被截断到允许范围内
    pub fn otp_lookback(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.otp_lookback_minutes.clamp(0, MAX_LOOKBACK_MINUTES))
    }
}

fn parse_var<T: std::str::FromStr>(
    var_name: &str,
    value: &str,
    expected_type: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
