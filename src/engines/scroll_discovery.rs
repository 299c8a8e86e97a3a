// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{EngineError, RenderSession};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 滚动发现参数
#[derive(Debug, Clone)]
pub struct ScrollSettings {
    /// 最大滚动轮数
    pub max_iterations: u32,
    /// 连续相同高度读数阈值
    pub stable_readings: u32,
    /// 滚动后的等待时间
    pub settle_interval: Duration,
    /// 点击"加载更多"后的等待时间
    pub load_more_settle: Duration,
    /// "加载更多"控件文本
    pub load_more_labels: Vec<String>,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            stable_readings: 3,
            settle_interval: Duration::from_secs(1),
            load_more_settle: Duration::from_secs(2),
            load_more_labels: vec![
                "load more".to_string(),
                "show more".to_string(),
                "view more".to_string(),
            ],
        }
    }
}

impl From<&BrowserSettings> for ScrollSettings {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            max_iterations: settings.max_scroll_iterations,
            stable_readings: settings.stable_height_readings,
            settle_interval: Duration::from_millis(settings.settle_interval_ms),
            load_more_settle: Duration::from_millis(settings.load_more_settle_ms),
            load_more_labels: settings
                .load_more_labels
                .iter()
                .map(|label| label.to_lowercase())
                .collect(),
        }
    }
}

/// 滚动结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 页面高度稳定，内容已耗尽
    Exhausted,
    /// 达到最大轮数
    IterationCap,
}

/// 一次滚动发现的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollReport {
    pub iterations: u32,
    pub load_more_clicks: u32,
    pub final_height: u64,
    pub stop_reason: StopReason,
}

/// 滚动/展开发现循环
///
/// 每轮：读取高度 → 滚动到底 → 等待 → 读取新高度。新高度与上一次读数相同则累加
/// 稳定计数（读数变化时重置为1），连续 `stable_readings` 个相同读数即停止。
/// 未停止时尝试点击"加载更多"，点击后使用更长的等待时间。
/// 无论高度如何，最多执行 `max_iterations` 轮。
pub struct ScrollDiscovery {
    settings: ScrollSettings,
}

impl ScrollDiscovery {
    pub fn new(settings: ScrollSettings) -> Self {
        Self { settings }
    }

    pub async fn run(&self, session: &mut dyn RenderSession) -> Result<ScrollReport, EngineError> {
        let mut previous: Option<u64> = None;
        let mut stable = 0u32;
        let mut iterations = 0u32;
        let mut load_more_clicks = 0u32;
        let mut final_height = 0u64;

        while iterations < self.settings.max_iterations {
            iterations += 1;

            let current = session.content_height().await?;
            session.scroll_to(current).await?;
            sleep(self.settings.settle_interval).await;

            let height = session.content_height().await?;
            final_height = height;

            if previous == Some(height) {
                stable += 1;
            } else {
                stable = 1;
            }
            previous = Some(height);

            if stable >= self.settings.stable_readings {
                debug!(
                    "Content exhausted after {} iterations at height {}",
                    iterations, height
                );
                return Ok(ScrollReport {
                    iterations,
                    load_more_clicks,
                    final_height,
                    stop_reason: StopReason::Exhausted,
                });
            }

            if session
                .click_load_more(&self.settings.load_more_labels)
                .await?
            {
                load_more_clicks += 1;
                sleep(self.settings.load_more_settle).await;
            }
        }

        debug!(
            "Scroll iteration cap {} reached at height {}",
            self.settings.max_iterations, final_height
        );
        Ok(ScrollReport {
            iterations,
            load_more_clicks,
            final_height,
            stop_reason: StopReason::IterationCap,
        })
    }
}
