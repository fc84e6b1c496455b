//! 基础设施层
//!
//! 持有外部资源（缓存、邮箱连接），只暴露能力，不处理业务流程。

pub mod mailbox;
pub mod otp_cache;

pub use mailbox::{ImapMailbox, Mailbox};
pub use otp_cache::{MemoryOtpCache, OtpCache, LATEST_OTP_KEY};
