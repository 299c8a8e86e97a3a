// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::CrawlJob;
use crate::infrastructure::cache::redis_client::RedisClient;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use redis::Script;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 每次出队时最多提升的到期任务数
const PROMOTE_BATCH: isize = 100;

/// 提交脚本：身份未结束时才写入负载并入队，三步在同一个脚本中原子完成
static SUBMIT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        if redis.call("SADD", KEYS[1], ARGV[1]) == 0 then
            return 0
        end
        redis.call("HSET", KEYS[2], ARGV[1], ARGV[2])
        redis.call("RPUSH", KEYS[3], ARGV[1])
        return 1
    "#,
    )
});

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 任务负载无法编解码
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 爬取任务队列特质
///
/// 队列按任务身份（规范化域名URL）去重：身份在完成或最终失败前一直处于"未结束"状态，
/// 期间重复提交会被忽略。重试由调度器通过 `retry` 显式安排，队列本身不决定重试。
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 提交任务，返回是否实际入队（身份未结束时返回false）
    async fn submit(&self, job: CrawlJob) -> Result<bool, QueueError>;

    /// 取出一个就绪任务
    ///
    /// 取出的任务进入活动状态；超过可见性超时仍未结束的任务会被重新投递
    async fn dequeue(&self) -> Result<Option<CrawlJob>, QueueError>;

    /// 安排重试：以新的负载在 `delay` 之后重新就绪
    async fn retry(&self, job: &CrawlJob, delay: Duration) -> Result<(), QueueError>;

    /// 标记完成并释放身份
    async fn complete(&self, identity: &str) -> Result<(), QueueError>;

    /// 标记最终失败并释放身份
    async fn fail(&self, identity: &str) -> Result<(), QueueError>;

    /// 未结束的任务数
    async fn outstanding(&self) -> Result<usize, QueueError>;
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn submit(&self, job: CrawlJob) -> Result<bool, QueueError> {
        (**self).submit(job).await
    }

    async fn dequeue(&self) -> Result<Option<CrawlJob>, QueueError> {
        (**self).dequeue().await
    }

    async fn retry(&self, job: &CrawlJob, delay: Duration) -> Result<(), QueueError> {
        (**self).retry(job, delay).await
    }

    async fn complete(&self, identity: &str) -> Result<(), QueueError> {
        (**self).complete(identity).await
    }

    async fn fail(&self, identity: &str) -> Result<(), QueueError> {
        (**self).fail(identity).await
    }

    async fn outstanding(&self) -> Result<usize, QueueError> {
        (**self).outstanding().await
    }
}

/// Redis任务队列实现
///
/// 键布局：
/// - `{prefix}:queue:outstanding` - 未结束身份集合（去重）
/// - `{prefix}:queue:ready` - 就绪身份列表
/// - `{prefix}:queue:delayed` - 延迟重试有序集合，分数为就绪时间（毫秒）
/// - `{prefix}:queue:active` - 活动有序集合，分数为可见性截止时间（毫秒）
/// - `{prefix}:queue:jobs` - 身份到任务负载(JSON)的哈希
pub struct RedisJobQueue {
    redis: RedisClient,
    prefix: String,
    visibility_timeout: Duration,
}

impl RedisJobQueue {
    pub fn new(redis: RedisClient, prefix: impl Into<String>, visibility_timeout: Duration) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            visibility_timeout,
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}:queue:{}", self.prefix, name)
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// 把分数已到期的成员从有序集合移到就绪列表，返回移动数量
    async fn promote_due(&self, from: &str, now: i64) -> Result<usize, QueueError> {
        let zset = self.key(from);
        let ready = self.key("ready");
        let due = self.redis.zrange_due(&zset, now, PROMOTE_BATCH).await?;

        let mut moved = 0;
        for identity in due {
            // Only the caller that actually removes the member re-queues it.
            if self.redis.zrem(&zset, &identity).await? == 1 {
                self.redis.rpush(&ready, &identity).await?;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn release(&self, identity: &str) -> Result<(), QueueError> {
        self.redis.zrem(&self.key("active"), identity).await?;
        self.redis.zrem(&self.key("delayed"), identity).await?;
        self.redis.hdel(&self.key("jobs"), identity).await?;
        self.redis.srem(&self.key("outstanding"), identity).await?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn submit(&self, job: CrawlJob) -> Result<bool, QueueError> {
        let identity = job.identity();
        let payload = serde_json::to_string(&job)?;
        let keys = [self.key("outstanding"), self.key("jobs"), self.key("ready")];

        let added: i64 = self
            .redis
            .run_script(
                &SUBMIT_SCRIPT,
                &[keys[0].as_str(), keys[1].as_str(), keys[2].as_str()],
                &[identity, payload.as_str()],
            )
            .await?;
        if added == 0 {
            debug!("Job {} already outstanding, ignoring submission", identity);
            return Ok(false);
        }
        Ok(true)
    }

    async fn dequeue(&self) -> Result<Option<CrawlJob>, QueueError> {
        let now = Self::now_millis();
        self.promote_due("delayed", now).await?;
        let stalled = self.promote_due("active", now).await?;
        if stalled > 0 {
            warn!("Re-delivering {} stalled jobs", stalled);
        }

        let ready = self.key("ready");
        while let Some(identity) = self.redis.lpop(&ready).await? {
            let Some(payload) = self.redis.hget(&self.key("jobs"), &identity).await? else {
                // Finished while waiting in the ready list.
                continue;
            };
            let job: CrawlJob = serde_json::from_str(&payload)?;
            let deadline = now + self.visibility_timeout.as_millis() as i64;
            self.redis.zadd(&self.key("active"), &identity, deadline).await?;
            return Ok(Some(job));
        }
        Ok(None)
    }

    async fn retry(&self, job: &CrawlJob, delay: Duration) -> Result<(), QueueError> {
        let identity = job.identity();
        let payload = serde_json::to_string(job)?;
        self.redis.hset(&self.key("jobs"), identity, &payload).await?;
        self.redis.zrem(&self.key("active"), identity).await?;
        let due = Self::now_millis() + delay.as_millis() as i64;
        self.redis.zadd(&self.key("delayed"), identity, due).await?;
        Ok(())
    }

    async fn complete(&self, identity: &str) -> Result<(), QueueError> {
        self.release(identity).await
    }

    async fn fail(&self, identity: &str) -> Result<(), QueueError> {
        self.release(identity).await
    }

    async fn outstanding(&self) -> Result<usize, QueueError> {
        Ok(self.redis.scard(&self.key("outstanding")).await?)
    }
}
