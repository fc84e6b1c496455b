//! 邮箱访问 - 基础设施层
//!
//! 只读访问收件箱，每次调用建立并关闭一次 IMAP 会话，不持有长连接。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::MailboxError;
use crate::models::MailMessage;

/// 单次最多拉取的邮件数（按序号取最新的几封）
const MAX_FETCH: usize = 20;

/// 只读邮箱
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// 返回 `since` 之后来自 `sender` 的邮件，顺序不保证
    async fn recent_messages(
        &self,
        sender: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MailMessage>, MailboxError>;
}

/// IMAP over TLS 邮箱
#[derive(Clone, Debug)]
pub struct ImapMailbox {
    server: String,
    port: u16,
    username: String,
    password: String,
}

impl ImapMailbox {
    pub fn new(config: &Config) -> Self {
        Self {
            server: config.imap_server.clone(),
            port: config.imap_port,
            username: config.imap_username.clone(),
            password: config.imap_password.clone(),
        }
    }

    /// 阻塞执行一次完整的 IMAP 会话
    fn fetch_blocking(
        &self,
        sender: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MailMessage>, MailboxError> {
        let tls = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| self.connect_error(e))?;
        let client = imap::connect((self.server.as_str(), self.port), &self.server, &tls)
            .map_err(|e| self.connect_error(e))?;
        let mut session = client
            .login(&self.username, &self.password)
            .map_err(|(e, _)| MailboxError::Login {
                username: self.username.clone(),
                reason: e.to_string(),
            })?;
        debug!("IMAP 登录成功: {}", self.username);

        // EXAMINE 以只读方式打开，不会改动已读状态
        session.examine("INBOX")?;

        let query = search_query(sender, since);
        debug!("IMAP 搜索: {}", query);
        let mut ids: Vec<u32> = session.search(&query)?.into_iter().collect();
        ids.sort_unstable();
        let newest = &ids[ids.len().saturating_sub(MAX_FETCH)..];

        let messages = if newest.is_empty() {
            Vec::new()
        } else {
            let set = newest
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let fetches = session.fetch(set, "RFC822")?;
            parse_batch(fetches.iter().filter_map(|fetch| fetch.body()))
        };

        session.logout()?;
        info!("📬 邮箱检查完成: {} 封匹配邮件", messages.len());
        Ok(messages)
    }

    fn connect_error(&self, e: impl std::fmt::Display) -> MailboxError {
        MailboxError::Connect {
            server: self.server.clone(),
            port: self.port,
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn recent_messages(
        &self,
        sender: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MailMessage>, MailboxError> {
        let mailbox = self.clone();
        let sender = sender.to_string();
        tokio::task::spawn_blocking(move || mailbox.fetch_blocking(&sender, since)).await?
    }
}

/// IMAP 的 SINCE 只精确到日期，分钟级过滤交给调用方
fn search_query(sender: &str, since: DateTime<Utc>) -> String {
    format!(
        "FROM \"{}\" SINCE {}",
        sender.replace('"', ""),
        since.format("%d-%b-%Y")
    )
}

/// 逐封解析，单封邮件解码失败只跳过它本身
fn parse_batch<'a>(raws: impl Iterator<Item = &'a [u8]>) -> Vec<MailMessage> {
    let mut messages = Vec::new();
    for raw in raws {
        match parse_message(raw) {
            Ok(Some(message)) => messages.push(message),
            Ok(None) => {}
            Err(e) => warn!("⚠️ 跳过无法解析的邮件: {}", e),
        }
    }
    messages
}

/// 解析原始邮件，取发件人、日期和全部纯文本正文
///
/// 没有 Date 头的邮件无法判断是否在时间窗口内，直接丢弃。
fn parse_message(raw: &[u8]) -> Result<Option<MailMessage>, MailboxError> {
    let parsed = mailparse::parse_mail(raw)?;
    let headers = parsed.get_headers();

    let from = headers.get_first_value("From").unwrap_or_default();
    let received_at = match headers
        .get_first_value("Date")
        .and_then(|date| mailparse::dateparse(&date).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    {
        Some(at) => at,
        None => {
            debug!("跳过缺少日期的邮件: {}", from);
            return Ok(None);
        }
    };

    let mut parts = Vec::new();
    collect_plain_text(&parsed, &mut parts)?;
    if parts.is_empty() {
        return Ok(None);
    }
    let body = parts.join("\n");

    Ok(Some(MailMessage {
        from,
        received_at,
        body,
    }))
}

/// 按出现顺序收集所有 text/plain 段；单段邮件整体算作正文
fn collect_plain_text(part: &ParsedMail<'_>, out: &mut Vec<String>) -> Result<(), MailboxError> {
    if part.subparts.is_empty() {
        out.push(part.get_body()?);
        return Ok(());
    }
    for sub in &part.subparts {
        if sub.subparts.is_empty() && sub.ctype.mimetype != "text/plain" {
            continue;
        }
        collect_plain_text(sub, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_query_format() {
        let since = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(
            search_query("cipc.co.za", since),
            r#"FROM "cipc.co.za" SINCE 05-Mar-2024"#
        );
    }

    #[test]
    fn test_parse_single_part_message() {
        let raw = b"From: noreply@cipc.co.za\r\n\
Date: Tue, 5 Mar 2024 10:02:00 +0000\r\n\
Subject: OTP\r\n\
Content-Type: text/plain\r\n\
\r\n\
Your OTP: 654321\r\n";

        let message = parse_message(raw).unwrap().unwrap();
        assert_eq!(message.from, "noreply@cipc.co.za");
        assert_eq!(
            message.received_at,
            Utc.with_ymd_and_hms(2024, 3, 5, 10, 2, 0).unwrap()
        );
        assert!(message.body.contains("654321"));
    }

    #[test]
    fn test_parse_multipart_prefers_plain_text() {
        let raw = b"From: noreply@cipc.co.za\r\n\
Date: Tue, 5 Mar 2024 10:02:00 +0000\r\n\
Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>code 111111</p>\r\n\
--XYZ\r\n\
Content-Type: text/plain\r\n\
\r\n\
verification: 222222\r\n\
--XYZ--\r\n";

        let message = parse_message(raw).unwrap().unwrap();
        assert!(message.body.contains("222222"));
        assert!(!message.body.contains("111111"));
    }

    #[test]
    fn test_code_in_second_plain_part_is_kept() {
        let raw = b"From: noreply@cipc.co.za\r\n\
Date: Tue, 5 Mar 2024 10:02:00 +0000\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain\r\n\
\r\n\
Dear customer,\r\n\
--XYZ\r\n\
Content-Type: text/plain\r\n\
\r\n\
Your OTP: 333444\r\n\
--XYZ--\r\n";

        let message = parse_message(raw).unwrap().unwrap();
        assert!(message.body.contains("Dear customer"));
        assert!(message.body.contains("333444"));
    }

    #[test]
    fn test_undecodable_message_does_not_hide_others() {
        let broken: &[u8] = b"From: noreply@cipc.co.za\r\n\
Date: Tue, 5 Mar 2024 09:58:00 +0000\r\n\
Content-Type: text/plain\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
!!!not*base64@@@\r\n";
        let good: &[u8] = b"From: noreply@cipc.co.za\r\n\
Date: Tue, 5 Mar 2024 10:02:00 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
Your OTP: 654321\r\n";

        assert!(parse_message(broken).is_err());

        let messages = parse_batch([broken, good].into_iter());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body.contains("654321"));
    }

    #[test]
    fn test_message_without_date_is_skipped() {
        let raw = b"From: noreply@cipc.co.za\r\n\
Content-Type: text/plain\r\n\
\r\n\
Your OTP: 654321\r\n";

        assert!(parse_message(raw).unwrap().is_none());
    }

    /// 需要真实邮箱账号：IMAP_USERNAME / IMAP_PASSWORD
    #[tokio::test]
    #[ignore]
    async fn test_real_imap_inbox() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().expect("加载配置失败");
        config.validate_mailbox().expect("缺少邮箱账号");

        let mailbox = ImapMailbox::new(&config);
        let since = Utc::now() - config.otp_lookback();
        let messages = mailbox
            .recent_messages(&config.otp_sender, since)
            .await
            .expect("邮箱检查失败");
        println!("找到 {} 封邮件", messages.len());
    }
}
