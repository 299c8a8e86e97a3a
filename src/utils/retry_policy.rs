// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RetrySettings;
use serde::Deserialize;
use std::time::Duration;

/// 退避策略
///
/// 配置值为 `linear` 或 `exponential`，其他值在加载配置时被拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// base × attempt
    #[default]
    Linear,
    /// base × 2^(attempt-1)
    Exponential,
}

/// 重试策略配置
///
/// 每个域名任务最多执行 `max_retries + 1` 次。`attempt` 从0开始计数，
/// 第n次重试（n ≥ 1）之前等待 `calculate_backoff(n)`。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间
    pub base_delay: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避方式
    pub strategy: BackoffStrategy,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            strategy: BackoffStrategy::Linear,
            jitter_factor: 0.1,
            enable_jitter: false,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_backoff: Duration::from_millis(settings.max_delay_ms),
            strategy: settings.strategy,
            jitter_factor: settings.jitter_factor,
            enable_jitter: settings.jitter_factor > 0.0,
        }
    }
}

impl RetryPolicy {
    /// 总尝试次数上限（首次执行 + 重试）
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// 计算第 `retry` 次重试前的退避时间（retry 从1开始）
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        let base = self.base_delay.as_secs_f64();

        let backoff_secs = match self.strategy {
            BackoffStrategy::Exponential => base * 2f64.powi(retry as i32 - 1),
            BackoffStrategy::Linear => base * retry as f64,
        };

        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        let final_backoff = if self.enable_jitter && capped_backoff > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..=jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 已完成 `attempt` 次（从0计）执行失败后是否还能重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}
