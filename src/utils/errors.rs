// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 存储层错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted record for {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Queue error: {0}")]
    Queue(#[from] crate::queue::task_queue::QueueError),

    #[error("Event channel closed")]
    ChannelClosed,
}
