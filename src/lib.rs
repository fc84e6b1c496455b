//! # CIPC Automation
//!
//! 公司注册申报自动化：无头浏览器完成申报，并从短信 / 邮件中获取 OTP
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `OtpCache` - 带过期时间的缓存槽，读取即删除
//! - `Mailbox` - 只读收件箱（IMAP）
//! - `browser/` - 浏览器会话，用完必须关闭
//!
//! ### ② 业务能力层（Services）
//! - `FilingAutomator` - 单次申报，失败转换为结果而不是错误
//! - `OtpAcquirer` - 限时轮询：缓存 → 邮箱 → 等待
//! - `OtpExtractor` - 按优先级排列的验证码提取规则
//!
//! ### ③ 接口层（Interfaces）
//! - `api/` - 短信 webhook、OTP 等待接口、健康检查
//! - `cli` / `app` - 命令行入口与组件组装
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, MailboxError, OtpError};
pub use models::{ClientData, FilingResult, OtpSource, OtpToken, ServiceType};
pub use services::{FilingAutomator, OtpAcquirer};
