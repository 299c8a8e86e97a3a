// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排领域服务、队列与工作器完成一次爬取会话，并输出结果文件
pub mod report;
pub mod use_cases;
