// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 缓存（cache）：Redis客户端
/// - 可观测性（observability）：爬取指标与系统指标采集
/// - 仓库实现（repositories）：Redis与进程内的爬取存储
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod cache;
pub mod observability;
pub mod repositories;
