// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{EngineError, RenderSession, Renderer};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// 资源请求数在该时间窗口内不变时认为网络空闲
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);
const NETWORK_POLL_INTERVAL: Duration = Duration::from_millis(100);

const HEIGHT_SCRIPT: &str = "document.body ? document.body.scrollHeight : 0";
const RESOURCE_COUNT_SCRIPT: &str = "performance.getEntriesByType('resource').length";
const ANCHOR_SCRIPT: &str =
    "Array.from(document.querySelectorAll('a[href]')).map(a => a.href).filter(h => !!h)";

/// 浏览器启动配置
#[derive(Debug, Clone)]
pub struct BrowserLaunchConfig {
    /// 远程 Chrome 调试地址
    pub remote_debugging_url: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
    /// CDP 单次请求超时
    pub request_timeout: Duration,
}

impl BrowserLaunchConfig {
    pub fn from_settings(settings: &BrowserSettings, user_agent: &str) -> Self {
        Self {
            remote_debugging_url: settings
                .remote_debugging_url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok()),
            window_width: settings.window_width,
            window_height: settings.window_height,
            user_agent: user_agent.to_string(),
            request_timeout: Duration::from_secs(settings.navigation_timeout_secs),
        }
    }
}

/// Chromium渲染引擎
///
/// 基于chromiumoxide实现。每个会话独占一个浏览器进程（或一个远程连接），
/// 会话结束时整体释放。
pub struct ChromiumRenderer {
    config: BrowserLaunchConfig,
}

impl ChromiumRenderer {
    pub fn new(config: BrowserLaunchConfig) -> Self {
        Self { config }
    }

    async fn connect_or_launch(&self) -> Result<(Browser, chromiumoxide::Handler), EngineError> {
        if let Some(ref url) = self.config.remote_debugging_url {
            debug!("Connecting to remote Chrome instance at: {}", url);
            return Browser::connect(url).await.map_err(|e| {
                EngineError::BrowserUnavailable(format!("Failed to connect to remote Chrome: {}", e))
            });
        }

        let config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.config.request_timeout)
            .window_size(self.config.window_width, self.config.window_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-accelerated-2d-canvas")
            .build()
            .map_err(EngineError::BrowserUnavailable)?;

        Browser::launch(config)
            .await
            .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, EngineError> {
        let (browser, mut handler) = self.connect_or_launch().await?;

        // Spawn a handler to process browser events
        let handler = HandlerGuard(tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        }));

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?;
        page.set_user_agent(self.config.user_agent.as_str())
            .await
            .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?;

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            _handler: handler,
            remote: self.config.remote_debugging_url.is_some(),
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 事件处理任务守卫，drop时终止任务
struct HandlerGuard(JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Chromium渲染会话
///
/// drop时浏览器子进程随 `Browser` 一起被终止
struct ChromiumSession {
    browser: Browser,
    page: Page,
    _handler: HandlerGuard,
    remote: bool,
}

impl ChromiumSession {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, EngineError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| EngineError::Script(e.to_string()))
    }

    async fn wait_for_network_idle(&self) -> Result<(), EngineError> {
        let mut last_count: Option<u64> = None;
        let mut stable_since = Instant::now();

        loop {
            let count: f64 = self.eval(RESOURCE_COUNT_SCRIPT).await?;
            let count = count as u64;
            if last_count != Some(count) {
                last_count = Some(count);
                stable_since = Instant::now();
            } else if stable_since.elapsed() >= NETWORK_IDLE_WINDOW {
                return Ok(());
            }
            sleep(NETWORK_POLL_INTERVAL).await;
        }
    }
}

fn load_more_script(labels: &[String]) -> String {
    let labels = serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
            const labels = {labels};
            const candidates = Array.from(document.querySelectorAll('button, [role="button"], a'));
            const target = candidates.find(el => {{
                const text = (el.textContent || '').toLowerCase();
                if (!labels.some(label => text.includes(label))) return false;
                if (el.disabled) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }});
            if (!target) return false;
            target.click();
            return true;
        }})()"#
    )
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, limit: Duration) -> Result<(), EngineError> {
        timeout(limit, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| EngineError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| EngineError::Navigation(e.to_string()))?;
            self.wait_for_network_idle().await
        })
        .await
        .map_err(|_| EngineError::Timeout(limit))?
    }

    async fn content_height(&mut self) -> Result<u64, EngineError> {
        let height: f64 = self.eval(HEIGHT_SCRIPT).await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to(&mut self, y: u64) -> Result<(), EngineError> {
        self.page
            .evaluate(format!("window.scrollTo({{ top: {}, behavior: 'smooth' }})", y))
            .await
            .map_err(|e| EngineError::Script(format!("Scroll failed: {}", e)))?;
        Ok(())
    }

    async fn click_load_more(&mut self, labels: &[String]) -> Result<bool, EngineError> {
        if labels.is_empty() {
            return Ok(false);
        }
        self.eval(&load_more_script(labels)).await
    }

    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, EngineError> {
        self.eval(ANCHOR_SCRIPT).await
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        let ChromiumSession {
            mut browser,
            page,
            _handler,
            remote,
        } = *self;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }

        // A remote browser is shared; only the page belongs to this session.
        if !remote {
            browser
                .close()
                .await
                .map_err(|e| EngineError::Script(format!("Browser close failed: {}", e)))?;
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
        }
        Ok(())
    }
}
