/// 申报自动化服务
///
/// 打开浏览器会话，按业务类型走完页面流程，生成回执编号。
/// 对调用方永不报错：所有失败都转换为 `status = failed` 的结果。
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::browser::{BrowserLauncher, FilingSession};
use crate::config::Config;
use crate::models::{ClientData, FilingResult, ServiceType};

/// 门户登录信息
#[derive(Clone, Debug)]
pub struct PortalCredentials {
    pub username: String,
    pub password: String,
}

/// 申报自动化服务
pub struct FilingAutomator {
    launcher: Arc<dyn BrowserLauncher>,
    portal_url: String,
    credentials: PortalCredentials,
}

impl FilingAutomator {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        portal_url: impl Into<String>,
        credentials: PortalCredentials,
    ) -> Self {
        Self {
            launcher,
            portal_url: portal_url.into(),
            credentials,
        }
    }

    /// 使用已校验过的配置创建
    pub fn from_config(launcher: Arc<dyn BrowserLauncher>, config: &Config) -> Self {
        Self::new(
            launcher,
            config.portal_url.clone(),
            PortalCredentials {
                username: config.filing_username.clone(),
                password: config.filing_password.clone(),
            },
        )
    }

    /// 解析 JSON 客户资料后执行申报
    ///
    /// JSON 无效时直接返回失败结果，不会启动浏览器。
    pub async fn file_json(&self, service_type: &str, raw_client_data: &str) -> FilingResult {
        match ClientData::from_json(raw_client_data) {
            Ok(client) => self.file(service_type, client).await,
            Err(e) => {
                warn!("客户资料 JSON 无效: {}", e);
                FilingResult::failed(
                    service_type,
                    &ClientData::default(),
                    format!("Invalid client data: {}", e),
                )
            }
        }
    }

    /// 执行一次申报
    pub async fn file(&self, service_type: &str, client: ClientData) -> FilingResult {
        let Some(service) = ServiceType::from_name(service_type) else {
            warn!("未知的业务类型: {}", service_type);
            return FilingResult::failed(
                service_type,
                &client,
                format!("Unknown service type: {}", service_type),
            );
        };

        info!(
            "📋 开始申报: {} | 公司: {}",
            service.name(),
            client.company_name()
        );

        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                error!("❌ 浏览器启动失败: {:#}", e);
                return FilingResult::failed(service.name(), &client, format!("{:#}", e));
            }
        };

        // 无论流程成败都要关闭会话
        let outcome = self.run_steps(session.as_mut(), service).await;
        if let Err(e) = session.close().await {
            warn!("⚠️ 关闭浏览器会话失败: {:#}", e);
        }

        match outcome {
            Ok(()) => {
                let now = Utc::now();
                let reference_number = service.reference_number(now);
                info!("✅ 申报完成: {}", reference_number);
                FilingResult::success(service, &client, reference_number, now)
            }
            Err(e) => {
                error!("❌ 申报失败 ({}): {:#}", service.name(), e);
                FilingResult::failed(service.name(), &client, format!("{:#}", e))
            }
        }
    }

    /// 页面操作序列
    async fn run_steps(&self, session: &mut dyn FilingSession, service: ServiceType) -> Result<()> {
        let target = self.target_url(service);
        session.goto(&target).await?;

        let form_found = session.evaluate(&self.login_script()).await?;
        debug!("登录表单: {}", form_found);

        let title = session.title().await?;
        debug!("页面标题: {:?}", title);
        Ok(())
    }

    fn target_url(&self, service: ServiceType) -> String {
        format!("{}{}", self.portal_url.trim_end_matches('/'), service.path())
    }

    /// 页面上存在登录表单时填入账号，返回是否找到表单
    fn login_script(&self) -> String {
        // 用 JSON 编码保证字符串在 JS 中安全
        let username = serde_json::Value::from(self.credentials.username.as_str());
        let password = serde_json::Value::from(self.credentials.password.as_str());
        format!(
            r#"
            (() => {{
                const user = document.querySelector('input[name="username"]');
                const pass = document.querySelector('input[type="password"]');
                if (!user || !pass) {{
                    return false;
                }}
                user.value = {};
                pass.value = {};
                return true;
            }})()
            "#,
            username, password
        )
    }
}
