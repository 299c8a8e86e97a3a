// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 分层加载并校验Redis、爬取调度、抓取、浏览器、重试与输出等配置
pub mod settings;
