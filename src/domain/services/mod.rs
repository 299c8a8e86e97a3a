// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - URL分类（url_classifier）：按路径结构判断商品详情页链接
/// - 域名爬取（domain_crawler）：合并两种提取器结果并完成去重写入
pub mod domain_crawler;
pub mod url_classifier;
