// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非2xx响应
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),
    /// 超时
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 页面脚本执行失败
    #[error("Script evaluation failed: {0}")]
    Script(String),
    /// 浏览器无法启动或连接
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),
    /// 无效的页面URL
    #[error("Invalid page URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// 响应内容无法处理
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl EngineError {
    /// 判断错误是否可恢复
    ///
    /// 可恢复错误只会让单个提取器返回空集合，不会中断整个任务
    ///
    /// # 返回值
    ///
    /// 如果错误是可恢复的则返回true，否则返回false
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => !e.is_decode() && !e.is_builder(),
            EngineError::HttpStatus(_)
            | EngineError::Timeout(_)
            | EngineError::Navigation(_)
            | EngineError::Script(_) => true,
            EngineError::BrowserUnavailable(_)
            | EngineError::InvalidUrl { .. }
            | EngineError::MalformedResponse(_) => false,
        }
    }
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 请求头
    pub headers: HashMap<String, String>,
    /// 超时时间
    pub timeout: Duration,
}

/// 抓取响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub content: String,
    /// 最终URL（跟随重定向后）
    pub final_url: String,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// HTTP抓取特质
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 执行一次有超时的GET请求
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 渲染会话
///
/// 一个会话对应一个浏览器页面。调用方必须在所有退出路径上调用 `close`；
/// 实现者在被drop时也要释放浏览器进程。
#[async_trait]
pub trait RenderSession: Send {
    /// 导航到URL并等待网络空闲，超过 `timeout` 视为失败
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    /// 当前页面内容高度
    async fn content_height(&mut self) -> Result<u64, EngineError>;

    /// 滚动到指定纵坐标
    async fn scroll_to(&mut self, y: u64) -> Result<(), EngineError>;

    /// 查找文本包含任一标签（忽略大小写）的可见可点击控件并点击，返回是否点击
    async fn click_load_more(&mut self, labels: &[String]) -> Result<bool, EngineError>;

    /// 当前DOM中所有锚点的绝对href
    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, EngineError>;

    /// 释放会话
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// 渲染引擎特质
#[async_trait]
pub trait Renderer: Send + Sync {
    /// 获取一个新的渲染会话；失败表示浏览器不可用
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 商品链接提取器特质
///
/// 可恢复错误在实现内部被吸收为空集合；返回的 `Err` 都是本次尝试的致命错误。
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    async fn extract(&self, page_url: &str) -> Result<HashSet<String>, EngineError>;

    /// 提取器名称
    fn name(&self) -> &'static str;
}
