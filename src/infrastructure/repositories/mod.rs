// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供 `CrawlStore` 的Redis实现与进程内实现
pub mod memory_crawl_store;
pub mod redis_crawl_store;
