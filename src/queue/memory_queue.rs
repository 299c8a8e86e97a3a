// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::CrawlJob;
use crate::queue::task_queue::{JobQueue, QueueError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Default)]
struct QueueState {
    outstanding: HashSet<String>,
    ready: VecDeque<String>,
    delayed: HashMap<String, Instant>,
    active: HashMap<String, Instant>,
    jobs: HashMap<String, CrawlJob>,
}

impl QueueState {
    fn promote(
        from: &mut HashMap<String, Instant>,
        ready: &mut VecDeque<String>,
        now: Instant,
    ) -> usize {
        let mut due: Vec<(String, Instant)> = from
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (id.clone(), *at))
            .collect();
        due.sort_by_key(|(_, at)| *at);

        for (identity, _) in &due {
            from.remove(identity);
            ready.push_back(identity.clone());
        }
        due.len()
    }

    fn release(&mut self, identity: &str) {
        self.outstanding.remove(identity);
        self.delayed.remove(identity);
        self.active.remove(identity);
        self.jobs.remove(identity);
        self.ready.retain(|id| id != identity);
    }
}

/// 进程内任务队列
///
/// 语义与Redis实现一致，时间基于tokio时钟，便于在暂停时间的测试中驱动延迟重试
pub struct InMemoryJobQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl InMemoryJobQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn submit(&self, job: CrawlJob) -> Result<bool, QueueError> {
        let mut state = self.state.lock().await;
        let identity = job.identity().to_string();
        if !state.outstanding.insert(identity.clone()) {
            debug!("Job {} already outstanding, ignoring submission", identity);
            return Ok(false);
        }
        state.jobs.insert(identity.clone(), job);
        state.ready.push_back(identity);
        Ok(true)
    }

    async fn dequeue(&self) -> Result<Option<CrawlJob>, QueueError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let QueueState {
            ready,
            delayed,
            active,
            ..
        } = &mut *state;
        QueueState::promote(delayed, ready, now);
        let stalled = QueueState::promote(active, ready, now);
        if stalled > 0 {
            warn!("Re-delivering {} stalled jobs", stalled);
        }

        while let Some(identity) = state.ready.pop_front() {
            let Some(job) = state.jobs.get(&identity).cloned() else {
                continue;
            };
            state
                .active
                .insert(identity, now + self.visibility_timeout);
            return Ok(Some(job));
        }
        Ok(None)
    }

    async fn retry(&self, job: &CrawlJob, delay: Duration) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let identity = job.identity().to_string();
        state.active.remove(&identity);
        state.jobs.insert(identity.clone(), job.clone());
        state.delayed.insert(identity, Instant::now() + delay);
        Ok(())
    }

    async fn complete(&self, identity: &str) -> Result<(), QueueError> {
        self.state.lock().await.release(identity);
        Ok(())
    }

    async fn fail(&self, identity: &str) -> Result<(), QueueError> {
        self.state.lock().await.release(identity);
        Ok(())
    }

    async fn outstanding(&self) -> Result<usize, QueueError> {
        Ok(self.state.lock().await.outstanding.len())
    }
}
