// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::report::ReportWriter;
use crate::config::settings::{Backend, Settings};
use crate::domain::models::domain_target::DomainTarget;
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::domain::services::domain_crawler::DomainCrawler;
use crate::domain::services::url_classifier::ProductUrlClassifier;
use crate::engines::browser_engine::{BrowserLaunchConfig, ChromiumRenderer};
use crate::engines::dynamic_extractor::DynamicExtractor;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::scroll_discovery::{ScrollDiscovery, ScrollSettings};
use crate::engines::static_extractor::StaticExtractor;
use crate::engines::traits::LinkExtractor;
use crate::infrastructure::cache::redis_client::RedisClient;
use crate::infrastructure::observability::metrics::MetricsCollector;
use crate::infrastructure::repositories::memory_crawl_store::MemoryCrawlStore;
use crate::infrastructure::repositories::redis_crawl_store::RedisCrawlStore;
use crate::queue::memory_queue::InMemoryJobQueue;
use crate::queue::task_queue::{JobQueue, RedisJobQueue};
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::dispatcher::{Dispatcher, RunSummary};
use crate::workers::manager::{WorkerManager, WorkerPoolConfig};
use anyhow::Context;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// 关闭时等待worker退出的宽限期
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// 爬取会话
///
/// 一次完整运行的生命周期：清空命名空间 → 启动指标 → 提交并调度 → 写结果 → 关闭。
/// 中断（Ctrl-C）走同一条关闭路径，结果文件仍然会写出。
pub struct CrawlSession {
    settings: Settings,
    targets: Vec<DomainTarget>,
    store: Arc<dyn CrawlStore>,
    queue: Arc<dyn JobQueue>,
    static_extractor: Arc<dyn LinkExtractor>,
    dynamic_extractor: Arc<dyn LinkExtractor>,
}

impl CrawlSession {
    pub fn new(
        settings: Settings,
        store: Arc<dyn CrawlStore>,
        queue: Arc<dyn JobQueue>,
        static_extractor: Arc<dyn LinkExtractor>,
        dynamic_extractor: Arc<dyn LinkExtractor>,
    ) -> anyhow::Result<Self> {
        let targets = settings
            .crawler
            .domains
            .iter()
            .map(|raw| {
                DomainTarget::parse(raw).with_context(|| format!("Invalid domain URL: {}", raw))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            settings,
            targets,
            store,
            queue,
            static_extractor,
            dynamic_extractor,
        })
    }

    /// 按配置构建全部组件
    ///
    /// 选择Redis后端时立即建立连接，连接失败直接返回错误
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let needs_redis = settings.crawler.store_backend == Backend::Redis
            || settings.crawler.queue_backend == Backend::Redis;
        let redis = if needs_redis {
            let client = RedisClient::new(&settings.redis.url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", settings.redis.url))?;
            info!("Connected to Redis at {}", settings.redis.url);
            Some(client)
        } else {
            None
        };

        let prefix = settings.redis.key_prefix.clone();
        let store: Arc<dyn CrawlStore> = match (settings.crawler.store_backend, &redis) {
            (Backend::Redis, Some(client)) => {
                Arc::new(RedisCrawlStore::new(client.clone(), prefix.clone()))
            }
            _ => Arc::new(MemoryCrawlStore::new()),
        };
        let queue: Arc<dyn JobQueue> = match (settings.crawler.queue_backend, &redis) {
            (Backend::Redis, Some(client)) => Arc::new(RedisJobQueue::new(
                client.clone(),
                prefix,
                settings.crawler.visibility_timeout(),
            )),
            _ => Arc::new(InMemoryJobQueue::new(settings.crawler.visibility_timeout())),
        };

        let classifier = ProductUrlClassifier::with_extra_patterns(
            &settings.crawler.extra_product_patterns,
        )
        .context("Invalid extra product pattern")?;

        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), settings.fetch.accept.clone());
        headers.insert(
            "Accept-Language".to_string(),
            settings.fetch.accept_language.clone(),
        );
        let static_extractor = StaticExtractor::new(
            ReqwestEngine::new(&settings.fetch.user_agent),
            Arc::new(classifier),
            headers,
            settings.fetch.timeout(),
        );

        let renderer = ChromiumRenderer::new(BrowserLaunchConfig::from_settings(
            &settings.browser,
            &settings.fetch.user_agent,
        ));
        let dynamic_extractor = DynamicExtractor::new(
            renderer,
            ScrollDiscovery::new(ScrollSettings::from(&settings.browser)),
            Duration::from_secs(settings.browser.navigation_timeout_secs),
        );

        Self::new(
            settings,
            store,
            queue,
            Arc::new(static_extractor),
            Arc::new(dynamic_extractor),
        )
    }

    pub fn targets(&self) -> &[DomainTarget] {
        &self.targets
    }

    /// 运行直到全部域名结束或收到Ctrl-C
    pub async fn run(self) -> anyhow::Result<RunSummary> {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// 运行直到全部域名结束或 `shutdown` 完成
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let run_id = Uuid::new_v4();
        info!(
            "Starting crawl run {} for {} domains",
            run_id,
            self.targets.len()
        );
        self.execute(shutdown)
            .instrument(info_span!("crawl_run", %run_id))
            .await
    }

    async fn execute<F>(self, shutdown: F) -> anyhow::Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        self.store
            .clear_all()
            .await
            .context("Failed to clear crawl store")?;

        let mut metrics = MetricsCollector::new(self.settings.metrics.clone());
        metrics.start();

        let crawler = Arc::new(DomainCrawler::new(
            self.store.clone(),
            self.static_extractor.clone(),
            self.dynamic_extractor.clone(),
        ));
        let mut manager = WorkerManager::new(
            self.queue.clone(),
            crawler,
            WorkerPoolConfig {
                workers: self.settings.crawler.workers,
                job_interval: Duration::from_millis(self.settings.rate_limiting.job_interval_ms),
                poll_interval: self.settings.crawler.poll_interval(),
                shutdown_grace: SHUTDOWN_GRACE,
            },
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        manager.start_workers(events_tx);

        let dispatcher = Dispatcher::new(
            self.queue.clone(),
            self.store.clone(),
            RetryPolicy::from(&self.settings.retry),
        );
        let dispatched = dispatcher.run(&self.targets, events_rx, shutdown).await;

        manager.shutdown().await;

        let writer = ReportWriter::new(self.store.clone(), &self.settings.output.path);
        let report = writer.write(&self.targets).await;

        metrics.stop().await;

        let summary = dispatched.context("Dispatcher failed")?;
        report.with_context(|| format!("Failed to write {}", writer.path().display()))?;

        if summary.is_drained() {
            info!(
                "Crawl finished: {} completed, {} failed, {} retries",
                summary.completed.len(),
                summary.failed.len(),
                summary.retries
            );
        } else {
            warn!(
                "Crawl interrupted: {} completed, {} failed, {} unresolved",
                summary.completed.len(),
                summary.failed.len(),
                summary.unresolved.len()
            );
        }
        for failed in &summary.failed {
            warn!("Failed domain: {}", failed);
        }

        Ok(summary)
    }
}
