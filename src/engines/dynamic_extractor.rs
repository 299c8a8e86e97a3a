// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::url_classifier;
use crate::engines::scroll_discovery::ScrollDiscovery;
use crate::engines::traits::{EngineError, LinkExtractor, RenderSession, Renderer};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// 动态页面提取器
///
/// 在浏览器中渲染页面，运行滚动/展开发现循环后收集DOM中的商品锚点。
///
/// 错误分类：
/// - 浏览器无法启动：致命，向上传播
/// - 导航失败或超时：可恢复，返回空集合
/// - 滚动循环中的任何失败：可恢复，丢弃已收集的部分结果
pub struct DynamicExtractor<R: Renderer> {
    renderer: R,
    discovery: ScrollDiscovery,
    navigation_timeout: Duration,
}

impl<R: Renderer> DynamicExtractor<R> {
    pub fn new(renderer: R, discovery: ScrollDiscovery, navigation_timeout: Duration) -> Self {
        Self {
            renderer,
            discovery,
            navigation_timeout,
        }
    }

    async fn discover(
        &self,
        session: &mut dyn RenderSession,
        page_url: &str,
    ) -> Result<HashSet<String>, EngineError> {
        if let Err(e) = session.navigate(page_url, self.navigation_timeout).await {
            if e.is_recoverable() {
                warn!("Error scraping dynamic page {}: {}", page_url, e);
                return Ok(HashSet::new());
            }
            return Err(e);
        }

        let collected = async {
            let report = self.discovery.run(session).await?;
            debug!(
                "Scroll discovery on {} finished: {:?} after {} iterations ({} load-more clicks)",
                page_url, report.stop_reason, report.iterations, report.load_more_clicks
            );
            session.anchor_hrefs().await
        }
        .await;

        match collected {
            Ok(hrefs) => Ok(hrefs
                .into_iter()
                .filter(|href| url_classifier::has_product_marker(href))
                .collect()),
            Err(e) => {
                warn!(
                    "Discarding partial results for dynamic page {}: {}",
                    page_url, e
                );
                Ok(HashSet::new())
            }
        }
    }
}

#[async_trait]
impl<R: Renderer> LinkExtractor for DynamicExtractor<R> {
    async fn extract(&self, page_url: &str) -> Result<HashSet<String>, EngineError> {
        let mut session = self.renderer.open_session().await?;

        let result = self.discover(session.as_mut(), page_url).await;

        if let Err(e) = session.close().await {
            warn!("Failed to release browser session for {}: {}", page_url, e);
        }

        result
    }

    fn name(&self) -> &'static str {
        "dynamic"
    }
}
