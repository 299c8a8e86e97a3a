// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：爬取目标、任务与域名元数据
/// - 仓库接口（repositories）：访问记录与结果存储的抽象
/// - 服务（services）：商品URL分类与单域名爬取
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
