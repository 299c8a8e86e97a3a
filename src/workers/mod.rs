// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供爬取工作器、工作器池管理以及驱动重试状态机的调度器
pub mod crawl_worker;
pub mod dispatcher;
pub mod manager;
pub mod worker;

pub use worker::Worker;
