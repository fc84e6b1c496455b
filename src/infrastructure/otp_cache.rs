//! OTP 缓存槽 - 基础设施层
//!
//! 短信 webhook 是唯一的写入方，OTP 获取流程是唯一的读取方，
//! 二者只通过 `put` / `take` 同步。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CacheError;

/// 缓存槽的默认键名
pub const LATEST_OTP_KEY: &str = "latest_otp";

/// 带过期时间的键值缓存
#[async_trait]
pub trait OtpCache: Send + Sync {
    /// 写入（覆盖已有值），`ttl` 后自动失效
    async fn put(&self, key: &str, code: &str, ttl: Duration) -> Result<(), CacheError>;

    /// 读取并删除，读和删是一个原子操作
    async fn take(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 只读查看，不删除
    async fn peek(&self, key: &str) -> Result<Option<String>, CacheError>;
}

#[derive(Debug)]
struct Entry {
    code: String,
    expires_at: Instant,
}

/// 进程内缓存实现
#[derive(Debug, Default)]
pub struct MemoryOtpCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryOtpCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpCache for MemoryOtpCache {
    async fn put(&self, key: &str, code: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                code: code.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        debug!("缓存写入: {} (有效期 {}s)", key, ttl.as_secs());
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.remove(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.code)),
            Some(_) => {
                debug!("缓存已过期: {}", key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn peek(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.code.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_take_removes_value() {
        let cache = MemoryOtpCache::new();
        cache
            .put(LATEST_OTP_KEY, "123456", Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(
            cache.take(LATEST_OTP_KEY).await.unwrap(),
            Some("123456".to_string())
        );
        assert_eq!(cache.take(LATEST_OTP_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_code() {
        let cache = MemoryOtpCache::new();
        cache
            .put(LATEST_OTP_KEY, "111111", Duration::from_secs(300))
            .await
            .unwrap();
        cache
            .put(LATEST_OTP_KEY, "222222", Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(
            cache.take(LATEST_OTP_KEY).await.unwrap(),
            Some("222222".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryOtpCache::new();
        cache
            .put(LATEST_OTP_KEY, "123456", Duration::from_secs(300))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(
            cache.peek(LATEST_OTP_KEY).await.unwrap(),
            Some("123456".to_string())
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.peek(LATEST_OTP_KEY).await.unwrap(), None);
        assert_eq!(cache.take(LATEST_OTP_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = MemoryOtpCache::new();
        cache
            .put("other", "999999", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.take(LATEST_OTP_KEY).await.unwrap(), None);
        assert_eq!(cache.peek("other").await.unwrap(), Some("999999".to_string()));
    }
}
