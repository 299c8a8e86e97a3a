// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::{CrawlJob, JobOutcome, JobState};
use crate::domain::models::domain_target::DomainTarget;
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::infrastructure::observability::metrics;
use crate::queue::task_queue::{JobQueue, QueueError};
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::crawl_worker::JobEvent;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 一次调度运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 去重后的目标数
    pub total: usize,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    /// 运行被中断时仍未结束的身份
    pub unresolved: Vec<String>,
    pub retries: u32,
}

impl RunSummary {
    pub fn is_drained(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// 单个身份的跟踪记录
#[derive(Debug)]
struct Tracked {
    state: JobState,
    attempt: u32,
}

/// 任务调度器
///
/// 提交全部目标后作为唯一的聚合者消费worker事件，驱动重试状态机：
/// 成功 → Completed；失败且未达上限 → Retrying（按退避延迟重新入队，再次开始时变为Active）；
/// 达到上限 → Failed，同时清除该域名的已访问标记。
///
/// 已结束的身份记录在集合中，重复的完成/失败通知会被忽略；
/// 与当前尝试次数不符的事件（停滞后被重新投递的旧实例）同样被忽略。
pub struct Dispatcher<S: CrawlStore> {
    queue: Arc<dyn JobQueue>,
    store: S,
    policy: RetryPolicy,
}

impl<S: CrawlStore> Dispatcher<S> {
    pub fn new(queue: Arc<dyn JobQueue>, store: S, policy: RetryPolicy) -> Self {
        Self {
            queue,
            store,
            policy,
        }
    }

    /// 提交全部目标并聚合事件直到所有身份结束，或 `shutdown` 完成
    pub async fn run<F>(
        &self,
        targets: &[DomainTarget],
        mut events: mpsc::UnboundedReceiver<JobEvent>,
        shutdown: F,
    ) -> Result<RunSummary, QueueError>
    where
        F: Future<Output = ()>,
    {
        let mut tracked = self.submit_all(targets).await?;
        let total = tracked.len();
        let mut resolved: HashSet<String> = HashSet::new();
        let mut summary = RunSummary {
            total,
            ..Default::default()
        };

        tokio::pin!(shutdown);

        while resolved.len() < total {
            let event = tokio::select! {
                _ = &mut shutdown => {
                    warn!(
                        "Dispatch interrupted with {}/{} domains resolved",
                        resolved.len(),
                        total
                    );
                    break;
                }
                event = events.recv() => event,
            };

            let Some(event) = event else {
                error!("All workers stopped before the run drained");
                break;
            };

            match event {
                JobEvent::Started { identity, attempt } => {
                    if let Some(entry) = tracked.get_mut(&identity) {
                        if entry.attempt == attempt && !entry.state.is_terminal() {
                            entry.state = JobState::Active;
                            debug!("{} is active (attempt {})", identity, attempt + 1);
                        }
                    }
                }
                JobEvent::Finished {
                    job,
                    outcome,
                    retryable,
                } => {
                    let identity = job.identity().to_string();
                    if resolved.contains(&identity) {
                        debug!("Ignoring duplicate notification for {}", identity);
                        continue;
                    }
                    let Some(entry) = tracked.get_mut(&identity) else {
                        warn!("Ignoring event for unknown job {}", identity);
                        continue;
                    };
                    if entry.attempt != job.attempt {
                        debug!(
                            "Ignoring stale attempt {} for {} (current {})",
                            job.attempt, identity, entry.attempt
                        );
                        continue;
                    }

                    let next_state = self.transition(&job, outcome, retryable).await;
                    entry.state = next_state;
                    match next_state {
                        JobState::Completed => summary.completed.push(identity.clone()),
                        JobState::Failed => summary.failed.push(identity.clone()),
                        _ => {
                            entry.attempt = job.attempt + 1;
                            summary.retries += 1;
                        }
                    }

                    if next_state.is_terminal() {
                        resolved.insert(identity);
                        info!(
                            "Progress: {:.1}% ({}/{} domains, {} failed)",
                            resolved.len() as f64 * 100.0 / total as f64,
                            resolved.len(),
                            total,
                            summary.failed.len()
                        );
                    }
                }
            }
        }

        summary.unresolved = tracked
            .into_iter()
            .filter(|(identity, _)| !resolved.contains(identity))
            .map(|(identity, _)| identity)
            .collect();
        summary.completed.sort();
        summary.failed.sort();
        summary.unresolved.sort();
        Ok(summary)
    }

    async fn submit_all(
        &self,
        targets: &[DomainTarget],
    ) -> Result<HashMap<String, Tracked>, QueueError> {
        let mut tracked = HashMap::new();
        for target in targets {
            if tracked.contains_key(target.identity()) {
                debug!("Skipping duplicate target {}", target.url);
                continue;
            }
            if !self.queue.submit(CrawlJob::new(target.clone())).await? {
                warn!("{} already has an outstanding job", target);
            }
            metrics::record_job_submitted();
            tracked.insert(
                target.identity().to_string(),
                Tracked {
                    state: JobState::Queued,
                    attempt: 0,
                },
            );
        }
        info!("Submitted {} domains", tracked.len());
        Ok(tracked)
    }

    /// 处理一次结束事件，返回新的状态
    ///
    /// 队列操作失败不会中断整个调度：重试或失败路径上的错误使该身份直接进入Failed，
    /// 其他域名继续推进
    async fn transition(&self, job: &CrawlJob, outcome: JobOutcome, retryable: bool) -> JobState {
        let identity = job.identity();

        match outcome {
            JobOutcome::Success(urls) => {
                // Results are already persisted; a lost ack only leaves the identity outstanding.
                if let Err(e) = self.queue.complete(identity).await {
                    error!("Failed to acknowledge completion of {}: {}", identity, e);
                }
                metrics::record_job_completed(urls.len());
                if urls.is_empty() {
                    info!("Completed {} (already visited)", identity);
                } else {
                    info!("Completed {} with {} product URLs", identity, urls.len());
                }
                JobState::Completed
            }
            JobOutcome::Failure(reason) if retryable && self.policy.should_retry(job.attempt) => {
                let next = job.next_attempt();
                let delay = self.policy.calculate_backoff(next.attempt);
                info!(
                    "Retrying {} in {:?} (attempt {}/{}): {}",
                    identity,
                    delay,
                    next.attempt + 1,
                    self.policy.max_attempts(),
                    reason
                );
                match self.queue.retry(&next, delay).await {
                    Ok(()) => {
                        metrics::record_job_retried();
                        JobState::Retrying
                    }
                    Err(e) => {
                        self.give_up(job, &format!("unable to schedule retry: {}", e))
                            .await
                    }
                }
            }
            JobOutcome::Failure(reason) => self.give_up(job, &reason).await,
        }
    }

    /// 最终失败：清除已访问标记并释放队列身份
    async fn give_up(&self, job: &CrawlJob, reason: &str) -> JobState {
        let identity = job.identity();
        if let Err(e) = self.store.unmark_visited(identity).await {
            error!("Failed to clear visited mark for {}: {}", identity, e);
        }
        if let Err(e) = self.queue.fail(identity).await {
            error!("Failed to release failed job {}: {}", identity, e);
        }
        metrics::record_job_failed();
        error!(
            "Giving up on {} after {} attempts: {}",
            identity,
            job.attempt + 1,
            reason
        );
        JobState::Failed
    }
}
