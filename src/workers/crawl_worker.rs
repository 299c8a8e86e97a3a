// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::{CrawlJob, JobOutcome};
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::domain::services::domain_crawler::DomainCrawler;
use crate::infrastructure::observability::metrics;
use crate::queue::task_queue::JobQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Worker上报给调度器的结构化事件
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// 任务开始执行
    Started { identity: String, attempt: u32 },
    /// 任务执行结束
    Finished {
        job: CrawlJob,
        outcome: JobOutcome,
        /// 失败是否值得重试（成功时恒为false）
        retryable: bool,
    },
}

/// 爬取工作器
///
/// 循环从队列取任务，一次只处理一个。每个worker有独立的限速器，
/// 相邻两次任务启动之间至少间隔 `job_interval`。
pub struct CrawlWorker<S: CrawlStore> {
    name: String,
    queue: Arc<dyn JobQueue>,
    crawler: Arc<DomainCrawler<S>>,
    events: mpsc::UnboundedSender<JobEvent>,
    limiter: Option<DefaultDirectRateLimiter>,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<S: CrawlStore> CrawlWorker<S> {
    pub fn new(
        id: usize,
        queue: Arc<dyn JobQueue>,
        crawler: Arc<DomainCrawler<S>>,
        events: mpsc::UnboundedSender<JobEvent>,
        job_interval: Duration,
        poll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            name: format!("crawl-worker-{}", id),
            queue,
            crawler,
            events,
            limiter: Quota::with_period(job_interval).map(RateLimiter::direct),
            poll_interval,
            shutdown,
        }
    }

    fn emit(&self, event: JobEvent) -> Result<(), WorkerError> {
        self.events
            .send(event)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    async fn process(&self, job: CrawlJob) -> Result<(), WorkerError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        self.emit(JobEvent::Started {
            identity: job.identity().to_string(),
            attempt: job.attempt,
        })?;

        let start = Instant::now();
        let (outcome, retryable) = match self.crawler.crawl(&job).await {
            Ok(urls) => (JobOutcome::Success(urls), false),
            Err(e) => {
                warn!(
                    "Attempt {} for {} failed: {}",
                    job.attempt + 1,
                    job.target,
                    e
                );
                (JobOutcome::Failure(e.to_string()), e.is_retryable())
            }
        };
        metrics::record_job_duration(start.elapsed());

        self.emit(JobEvent::Finished {
            job,
            outcome,
            retryable,
        })
    }
}

#[async_trait]
impl<S: CrawlStore + 'static> Worker for CrawlWorker<S> {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("{} started", self.name);
        let mut shutdown = self.shutdown.clone();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                _ = shutdown.changed() => break,
                next = self.queue.dequeue() => next,
            };

            let job = match next {
                Ok(Some(job)) => job,
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = sleep(self.poll_interval) => continue,
                    }
                }
                Err(e) => {
                    error!("{} failed to dequeue: {}", self.name, e);
                    sleep(self.poll_interval).await;
                    continue;
                }
            };

            debug!("{} picked up {} (attempt {})", self.name, job.target, job.attempt + 1);

            // Dropping the in-flight crawl releases its browser session.
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("{} interrupted while crawling", self.name);
                    break;
                }
                result = self.process(job) => result?,
            }
        }

        info!("{} stopped", self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
