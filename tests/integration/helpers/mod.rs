// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use prodscout::config::settings::Settings;
use prodscout::infrastructure::cache::redis_client::RedisClient;
use prodscout::engines::traits::{EngineError, LinkExtractor, RenderSession, Renderer};
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::core::WaitFor;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

/// 按页面URL返回固定链接的提取器，并记录每个页面被调用的次数
#[derive(Default)]
pub struct ScriptedExtractor {
    links: DashMap<String, Vec<String>>,
    calls: DashMap<String, usize>,
}

impl ScriptedExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_links(self: Arc<Self>, page_url: &str, links: &[&str]) -> Arc<Self> {
        self.links.insert(
            page_url.to_string(),
            links.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self, page_url: &str) -> usize {
        self.calls.get(page_url).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl LinkExtractor for ScriptedExtractor {
    async fn extract(&self, page_url: &str) -> Result<HashSet<String>, EngineError> {
        *self.calls.entry(page_url.to_string()).or_insert(0) += 1;
        Ok(self
            .links
            .get(page_url)
            .map(|links| links.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// 渲染固定页面的渲染器：高度不变，锚点固定
pub struct FixedPageRenderer {
    anchors: Vec<String>,
    closed: Arc<AtomicUsize>,
}

impl FixedPageRenderer {
    pub fn new(anchors: &[String]) -> Self {
        Self {
            anchors: anchors.to_vec(),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn closed_sessions(&self) -> Arc<AtomicUsize> {
        self.closed.clone()
    }
}

struct FixedPageSession {
    anchors: Vec<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderSession for FixedPageSession {
    async fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), EngineError> {
        Ok(())
    }

    async fn content_height(&mut self) -> Result<u64, EngineError> {
        Ok(2400)
    }

    async fn scroll_to(&mut self, _y: u64) -> Result<(), EngineError> {
        Ok(())
    }

    async fn click_load_more(&mut self, _labels: &[String]) -> Result<bool, EngineError> {
        Ok(false)
    }

    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, EngineError> {
        Ok(self.anchors.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Renderer for FixedPageRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, EngineError> {
        Ok(Box::new(FixedPageSession {
            anchors: self.anchors.clone(),
            closed: self.closed.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "fixed-page"
    }
}

/// 以进程内后端、很短的间隔构建测试配置
pub fn test_settings(domains: &[&str], workers: usize, output: &std::path::Path) -> Settings {
    let domains = domains
        .iter()
        .map(|d| format!("\"{}\"", d))
        .collect::<Vec<_>>()
        .join(", ");
    let contents = format!(
        r#"
[crawler]
domains = [{domains}]
workers = {workers}
queue_backend = "memory"
store_backend = "memory"
poll_interval_ms = 10
visibility_timeout_secs = 60

[retry]
max_retries = 3
base_delay_ms = 10
strategy = "exponential"

[rate_limiting]
job_interval_ms = 1

[output]
path = "{output}"

[metrics]
enabled = false
sample_interval_secs = 1
"#,
        output = output.display()
    );

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    Settings::from_file(file.path().to_str().unwrap()).unwrap()
}

/// 运行中的Redis容器及其客户端；容器在值被drop时停止
pub struct RedisFixture {
    pub client: RedisClient,
    /// 每个测试独立的键前缀
    pub prefix: String,
    _node: ContainerAsync<GenericImage>,
}

/// 启动一次性Redis容器
///
/// 没有可用的Docker守护进程时返回 `None`，调用方直接跳过测试
pub async fn start_redis() -> Option<RedisFixture> {
    let node = match GenericImage::new("redis", "7-alpine")
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
    {
        Ok(node) => node,
        Err(e) => {
            eprintln!("Skipping Redis test, container unavailable: {}", e);
            return None;
        }
    };
    let port = node
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get Redis port");
    let redis_url = format!("redis://127.0.0.1:{}", port);

    let mut client = None;
    for _ in 0..20 {
        match RedisClient::new(&redis_url).await {
            Ok(c) => {
                client = Some(c);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(250)).await,
        }
    }

    Some(RedisFixture {
        client: client.expect("Failed to connect to Redis container"),
        prefix: format!("prodscout-test-{}", uuid::Uuid::new_v4()),
        _node: node,
    })
}
