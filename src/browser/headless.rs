use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::{BrowserLauncher, FilingSession};
use crate::config::Config;

/// 无头浏览器启动器
#[derive(Clone, Debug)]
pub struct HeadlessLauncher {
    chrome_executable: Option<String>,
    headless: bool,
}

impl HeadlessLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            headless: config.headless,
        }
    }
}

#[async_trait]
impl BrowserLauncher for HeadlessLauncher {
    async fn launch(&self) -> Result<Box<dyn FilingSession>> {
        let session =
            launch_headless_browser(self.chrome_executable.as_deref(), self.headless).await?;
        Ok(Box::new(session))
    }
}

/// 启动浏览器并打开一个空白页
pub async fn launch_headless_browser(
    chrome_executable: Option<&str>,
    headless: bool,
) -> Result<HeadlessSession> {
    info!("🚀 启动无头浏览器...");

    let mut builder = if headless {
        BrowserConfig::builder().new_headless_mode()
    } else {
        BrowserConfig::builder().with_head()
    };
    if let Some(path) = chrome_executable {
        debug!("使用浏览器: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder
        .args(vec![
            "--disable-gpu",           // 容器里没有 GPU
            "--no-sandbox",            // 以 root 运行时必须关闭沙盒
            "--disable-dev-shm-usage", // 防止共享内存不足
        ])
        .build()
        .map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            anyhow::anyhow!("配置无头浏览器失败: {}", e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        anyhow::anyhow!("启动无头浏览器失败: {}", e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser
        .new_page("about:blank")
        .await
        .context("创建页面失败")?;

    Ok(HeadlessSession {
        browser,
        page,
        handler_task,
    })
}

/// chromiumoxide 浏览器会话
pub struct HeadlessSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl FilingSession for HeadlessSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        info!("已导航到: {}", url);
        Ok(())
    }

    async fn title(&mut self) -> Result<Option<String>> {
        self.page.get_title().await.context("读取页面标题失败")
    }

    async fn evaluate(&mut self, script: &str) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("执行脚本失败")?;
        Ok(result.into_value()?)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let HeadlessSession {
            mut browser,
            page: _,
            handler_task,
        } = *self;

        let closed = browser.close().await.context("关闭浏览器失败");
        if let Err(e) = browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        handler_task.abort();
        closed?;
        debug!("浏览器已关闭");
        Ok(())
    }
}
