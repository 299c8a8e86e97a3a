// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含爬取会话用例与结果文件写入
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 实现静态抓取、浏览器渲染以及两种商品链接提取器
pub mod engines;

/// 基础设施模块
///
/// 提供Redis客户端、存储实现与可观测性
pub mod infrastructure;

/// 队列模块
///
/// 实现按身份去重的任务队列
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现爬取工作器、工作器管理与调度
pub mod workers;
