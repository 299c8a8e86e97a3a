// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供按域名去重的爬取任务队列，支持延迟重试与停滞任务重新投递
pub mod memory_queue;
pub mod task_queue;

pub use memory_queue::InMemoryJobQueue;
pub use task_queue::{JobQueue, QueueError, RedisJobQueue};
