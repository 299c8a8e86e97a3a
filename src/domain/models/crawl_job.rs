// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_target::DomainTarget;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 域名爬取任务
///
/// 由调度器在入队时创建，每次重试 `attempt` 加一。
/// 重试次数作为显式负载随任务在队列中传递。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    /// 爬取目标
    pub target: DomainTarget,
    /// 已尝试次数，首次执行为0
    pub attempt: u32,
}

impl CrawlJob {
    pub fn new(target: DomainTarget) -> Self {
        Self { target, attempt: 0 }
    }

    /// 队列层去重使用的身份标识
    pub fn identity(&self) -> &str {
        self.target.identity()
    }

    /// 生成下一次重试的任务
    pub fn next_attempt(&self) -> Self {
        Self {
            target: self.target.clone(),
            attempt: self.attempt + 1,
        }
    }

    pub fn is_first_attempt(&self) -> bool {
        self.attempt == 0
    }
}

/// 任务状态
///
/// 状态转换：
/// Queued → Active → Completed / Retrying → Queued / Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Queued,
    Active,
    Retrying,
    Completed,
    Failed,
}

impl JobState {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Active => write!(f, "active"),
            JobState::Retrying => write!(f, "retrying"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// 任务执行结果
///
/// 只在 worker 与调度器之间流动，不直接持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// 成功（空集合表示已访问过而跳过）
    Success(HashSet<String>),
    /// 失败原因
    Failure(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }
}
