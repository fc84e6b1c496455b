use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::{self, AppState};
use crate::browser::HeadlessLauncher;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ImapMailbox, MemoryOtpCache};
use crate::models::{FilingResult, OtpToken};
use crate::services::{AcquireSettings, FilingAutomator, OtpAcquirer};
use crate::utils::logging;

/// 应用主结构
///
/// 按命令组装组件，所有依赖都在这里显式创建并注入。
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 执行一次申报
    pub async fn run_filing(
        &mut self,
        service_type: &str,
        client_data: &str,
    ) -> AppResult<FilingResult> {
        self.config.validate_filing()?;
        logging::log_startup("run", self.config.demo_mode);

        let launcher = Arc::new(HeadlessLauncher::new(&self.config));
        let automator = FilingAutomator::from_config(launcher, &self.config);
        let result = automator.file_json(service_type, client_data).await;

        logging::log_filing_result(&result);
        Ok(result)
    }

    /// 启动 webhook 服务
    pub async fn serve(&self, port: Option<u16>) -> AppResult<()> {
        self.config.validate_mailbox()?;
        self.config.validate_otp()?;
        logging::log_startup("serve", self.config.demo_mode);

        let state = AppState::new(
            &self.config,
            Arc::new(MemoryOtpCache::new()),
            Arc::new(ImapMailbox::new(&self.config)),
        );
        api::serve(port.unwrap_or(self.config.webhook_port), Arc::new(state)).await?;
        Ok(())
    }

    /// 从邮箱等待 OTP
    pub async fn wait_for_otp(&self, timeout_secs: Option<u64>) -> AppResult<OtpToken> {
        self.config.validate_mailbox()?;
        self.config.validate_otp()?;
        logging::log_startup("otp", self.config.demo_mode);

        let timeout = timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.config.otp_timeout());
        let acquirer = OtpAcquirer::new(
            Arc::new(MemoryOtpCache::new()),
            Arc::new(ImapMailbox::new(&self.config)),
            AcquireSettings::from_config(&self.config),
        );

        let token = acquirer.acquire(timeout).await?;
        info!("✓ 获取到 OTP: {}", token);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ConfigError};

    fn mailbox_config() -> Config {
        Config {
            imap_username: "filer@example.com".to_string(),
            imap_password: "secret".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_wait_for_otp_requires_mailbox_credentials() {
        let app = App::new(Config::default());
        let err = app.wait_for_otp(Some(1)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::MissingValue {
                var_name: "IMAP_USERNAME",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_wait_for_otp_rejects_zero_poll_interval() {
        let app = App::new(Config {
            otp_poll_interval_secs: 0,
            ..mailbox_config()
        });
        let err = app.wait_for_otp(Some(1)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidValue {
                var_name: "OTP_POLL_INTERVAL_SECS",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_serve_rejects_oversized_lookback_before_binding() {
        let app = App::new(Config {
            otp_lookback_minutes: i64::MAX,
            ..mailbox_config()
        });
        let err = app.serve(Some(0)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidValue {
                var_name: "OTP_LOOKBACK_MINUTES",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_run_filing_requires_credentials_outside_demo_mode() {
        let mut app = App::new(Config::default());
        let err = app
            .run_filing("annual_return", r#"{"company_name": "Test Co"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::MissingValue { .. })));
    }
}
