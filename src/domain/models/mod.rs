// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 爬取目标（domain_target）：配置中的域名及其规范化身份
/// - 爬取任务（crawl_job）：带尝试次数的任务负载、状态与结果
/// - 域名元数据（domain_metadata）：成功后写入、汇总时读取
pub mod crawl_job;
pub mod domain_metadata;
pub mod domain_target;
