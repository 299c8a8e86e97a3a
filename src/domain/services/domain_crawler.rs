// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::CrawlJob;
use crate::domain::models::domain_metadata::DomainMetadata;
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::engines::traits::{EngineError, LinkExtractor};
use crate::utils::errors::StoreError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// 单域名爬取错误
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 两个提取器都没有找到商品链接
    #[error("No product URLs found")]
    NoProductUrls,

    #[error("Extractor '{extractor}' failed: {source}")]
    Extractor {
        extractor: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CrawlError {
    /// 是否值得重试
    ///
    /// 提取失败与存储失败都可能是暂时的，只有配置类错误（无效URL）不重试
    pub fn is_retryable(&self) -> bool {
        match self {
            CrawlError::NoProductUrls | CrawlError::Store(_) => true,
            CrawlError::Extractor { source, .. } => {
                !matches!(source, EngineError::InvalidUrl { .. })
            }
        }
    }
}

/// 单域名爬取服务
///
/// 并发运行静态与动态提取器，合并结果并写入存储。
/// 首次尝试时若域名已标记为已访问则直接返回空集合；重试时总是重新爬取。
pub struct DomainCrawler<S: CrawlStore> {
    store: S,
    static_extractor: Arc<dyn LinkExtractor>,
    dynamic_extractor: Arc<dyn LinkExtractor>,
}

impl<S: CrawlStore> DomainCrawler<S> {
    pub fn new(
        store: S,
        static_extractor: Arc<dyn LinkExtractor>,
        dynamic_extractor: Arc<dyn LinkExtractor>,
    ) -> Self {
        Self {
            store,
            static_extractor,
            dynamic_extractor,
        }
    }

    /// 爬取一个域名
    ///
    /// # 返回值
    ///
    /// * `Ok(urls)` - 本次发现的商品URL（跳过时为空集合）
    /// * `Err(CrawlError::NoProductUrls)` - 合并结果为空，应当重试
    #[instrument(skip(self, job), fields(domain = %job.target, attempt = job.attempt))]
    pub async fn crawl(&self, job: &CrawlJob) -> Result<HashSet<String>, CrawlError> {
        let target = &job.target;
        let identity = target.identity();

        if job.is_first_attempt() && self.store.is_visited(identity).await? {
            info!("Skipping already visited domain: {}", identity);
            return Ok(HashSet::new());
        }

        let start = Instant::now();
        let (static_links, dynamic_links) = tokio::join!(
            self.static_extractor.extract(&target.url),
            self.dynamic_extractor.extract(&target.url)
        );

        let static_links = static_links.map_err(|source| CrawlError::Extractor {
            extractor: self.static_extractor.name(),
            source,
        })?;
        let dynamic_links = dynamic_links.map_err(|source| CrawlError::Extractor {
            extractor: self.dynamic_extractor.name(),
            source,
        })?;

        debug!(
            "Extractors finished in {}ms: {} static, {} dynamic",
            start.elapsed().as_millis(),
            static_links.len(),
            dynamic_links.len()
        );

        let mut urls = static_links;
        urls.extend(dynamic_links);

        if urls.is_empty() {
            return Err(CrawlError::NoProductUrls);
        }

        self.store.mark_visited(identity).await?;
        let added = self.store.add_product_urls(identity, &urls).await?;
        let metadata = DomainMetadata::new(target.name(), &urls);
        self.store.write_metadata(identity, &metadata).await?;

        info!(
            "Found {} product URLs for {} ({} new)",
            urls.len(),
            identity,
            added
        );
        Ok(urls)
    }
}
