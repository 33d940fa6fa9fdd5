//! 外部调用的重试策略
//!
//! 每个数据源持有一份策略，每次尝试都有独立超时，失败后按指数退避重试

use std::future::Future;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::services::providers::ProviderError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最多尝试次数（含首次）
    pub max_attempts: u32,
    /// 第一次重试前的等待时间，之后每次翻倍
    pub backoff: Duration,
    /// 单次尝试超时
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            max_attempts: api.max_attempts.max(1),
            backoff: Duration::from_millis(api.backoff_millis),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }

    /// 第 attempt 次失败后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    log::debug!(
                        "🔁 {} 第 {}/{} 次失败: {}，{:?} 后重试",
                        label, attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
