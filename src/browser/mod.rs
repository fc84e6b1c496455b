//! 浏览器会话
//!
//! 申报流程只通过 [`BrowserLauncher`] / [`FilingSession`] 操作页面，
//! 生产环境由 [`HeadlessLauncher`] 启动无头 Chromium，测试中可以替换成假实现。

pub mod headless;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

pub use headless::{launch_headless_browser, HeadlessLauncher, HeadlessSession};

/// 启动一个新的浏览器会话
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn FilingSession>>;
}

/// 一次申报使用的浏览器会话
///
/// 会话是稀缺资源：无论成功失败，调用方都必须调用 [`FilingSession::close`]。
#[async_trait]
pub trait FilingSession: Send {
    /// 导航到指定 URL 并等待加载完成
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// 当前页面标题
    async fn title(&mut self) -> Result<Option<String>>;

    /// 在页面中执行脚本并返回 JSON 结果
    async fn evaluate(&mut self, script: &str) -> Result<JsonValue>;

    /// 关闭浏览器并释放进程
    async fn close(self: Box<Self>) -> Result<()>;
}
