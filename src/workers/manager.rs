// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::crawl_store::CrawlStore;
use crate::domain::services::domain_crawler::DomainCrawler;
use crate::infrastructure::observability::metrics;
use crate::queue::task_queue::JobQueue;
use crate::workers::crawl_worker::{CrawlWorker, JobEvent};
use crate::workers::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 工作器池参数
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// 工作器数量
    pub workers: usize,
    /// 单个工作器相邻任务启动的最小间隔
    pub job_interval: Duration,
    /// 队列为空时的轮询间隔
    pub poll_interval: Duration,
    /// 关闭时等待工作器退出的时间
    pub shutdown_grace: Duration,
}

/// 工作管理器
pub struct WorkerManager<S: CrawlStore + 'static> {
    queue: Arc<dyn JobQueue>,
    crawler: Arc<DomainCrawler<S>>,
    config: WorkerPoolConfig,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl<S: CrawlStore + 'static> WorkerManager<S> {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        crawler: Arc<DomainCrawler<S>>,
        config: WorkerPoolConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            queue,
            crawler,
            config,
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动配置数量的工作进程，事件发送到 `events`
    pub fn start_workers(&mut self, events: mpsc::UnboundedSender<JobEvent>) {
        for id in 0..self.config.workers {
            let worker = CrawlWorker::new(
                id,
                self.queue.clone(),
                self.crawler.clone(),
                events.clone(),
                self.config.job_interval,
                self.config.poll_interval,
                self.shutdown_tx.subscribe(),
            );

            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("{} exited with error: {}", worker.name(), e);
                }
            });
            self.handles.push(handle);
        }

        metrics::set_active_workers(self.handles.len());
        info!("Started {} crawl workers", self.handles.len());
    }

    /// 关闭全部工作进程
    ///
    /// 先发送关闭信号让worker在安全点退出，超过宽限期仍未退出的直接中止
    pub async fn shutdown(&mut self) {
        if self.handles.is_empty() {
            return;
        }

        info!("Shutting down workers...");
        let _ = self.shutdown_tx.send(true);

        for mut handle in self.handles.drain(..) {
            match tokio::time::timeout(self.config.shutdown_grace, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Worker task ended abnormally: {}", e),
                Err(_) => {
                    warn!("Worker did not stop within grace period, aborting");
                    handle.abort();
                }
            }
        }

        metrics::set_active_workers(0);
        info!("Workers shut down successfully");
    }
}

impl<S: CrawlStore + 'static> Drop for WorkerManager<S> {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
