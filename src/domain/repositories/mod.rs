// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义访问记录、商品URL集合与域名元数据的存储契约，
/// 具体实现由基础设施层提供。
pub mod crawl_store;
