// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::retry_policy::BackoffStrategy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// 配置加载错误
#[derive(Error, Debug)]
pub enum SettingsError {
    /// 读取或反序列化失败
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    /// 校验失败
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// Redis配置
    #[validate(nested)]
    pub redis: RedisSettings,
    /// 爬取调度配置
    #[validate(nested)]
    pub crawler: CrawlerSettings,
    /// 静态抓取配置
    #[validate(nested)]
    pub fetch: FetchSettings,
    /// 浏览器渲染配置
    #[validate(nested)]
    pub browser: BrowserSettings,
    /// 重试配置
    #[validate(nested)]
    pub retry: RetrySettings,
    /// 速率限制配置
    #[validate(nested)]
    pub rate_limiting: RateLimitingSettings,
    /// 输出配置
    pub output: OutputSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// Redis配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedisSettings {
    /// Redis连接URL
    #[validate(length(min = 1))]
    pub url: String,
    /// 所有键的命名空间前缀
    #[validate(length(min = 1))]
    pub key_prefix: String,
}

/// 存储/队列后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Redis,
    Memory,
}

/// 爬取调度配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrawlerSettings {
    /// 目标域名列表
    #[validate(
        length(min = 1, message = "at least one domain is required"),
        custom(function = validate_domains)
    )]
    pub domains: Vec<String>,
    /// 并发worker数量
    #[validate(range(min = 1, max = 256))]
    pub workers: usize,
    /// 队列后端
    pub queue_backend: Backend,
    /// 存储后端
    pub store_backend: Backend,
    /// 队列为空时的轮询间隔（毫秒）
    #[validate(range(min = 10))]
    pub poll_interval_ms: u64,
    /// 任务可见性超时（秒），超时未确认的任务会被重新投递
    #[validate(range(min = 1))]
    pub visibility_timeout_secs: u64,
    /// 额外的商品URL模式（正则）
    pub extra_product_patterns: Vec<String>,
}

/// 静态抓取配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FetchSettings {
    /// 请求超时（秒）
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

/// 浏览器渲染配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BrowserSettings {
    /// 远程 Chrome 调试地址；为空时本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 导航超时（秒）
    #[validate(range(min = 1))]
    pub navigation_timeout_secs: u64,
    /// 滚动后等待内容加载的时间（毫秒）
    pub settle_interval_ms: u64,
    /// 点击"加载更多"后的等待时间（毫秒）
    pub load_more_settle_ms: u64,
    /// 滚动最大轮数
    #[validate(range(min = 1))]
    pub max_scroll_iterations: u32,
    /// 连续相同高度读数达到该值时认为内容已加载完
    #[validate(range(min = 1))]
    pub stable_height_readings: u32,
    pub window_width: u32,
    pub window_height: u32,
    /// "加载更多"按钮文本（小写子串匹配）
    pub load_more_labels: Vec<String>,
}

/// 重试配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RetrySettings {
    /// 最大重试次数（不含首次执行）
    #[validate(range(max = 20))]
    pub max_retries: u32,
    /// 基础退避时间（毫秒）
    pub base_delay_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_delay_ms: u64,
    /// linear | exponential
    pub strategy: BackoffStrategy,
    #[validate(range(min = 0.0, max = 1.0))]
    pub jitter_factor: f64,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateLimitingSettings {
    /// 每个worker两次任务启动之间的最小间隔（毫秒）
    #[validate(range(min = 1))]
    pub job_interval_ms: u64,
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 结果JSON文件路径
    pub path: String,
}

/// 指标配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出
    pub enabled: bool,
    pub listen_addr: String,
    /// 系统指标采样间隔（秒）
    pub sample_interval_secs: u64,
}

fn validate_domains(domains: &Vec<String>) -> Result<(), ValidationError> {
    for domain in domains {
        let parsed = url::Url::parse(domain).map_err(|_| invalid_domain(domain))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(invalid_domain(domain));
        }
    }
    Ok(())
}

fn invalid_domain(domain: &str) -> ValidationError {
    let mut error = ValidationError::new("invalid_domain");
    error.message = Some(format!("Invalid domain URL: {}", domain).into());
    error
}

impl CrawlerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 加载顺序：内置默认值 → `config/default` → `config/{APP_ENVIRONMENT}` → `PRODSCOUT__*` 环境变量。
    /// 加载后立即校验。
    pub fn new() -> Result<Self, SettingsError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PRODSCOUT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("crawler.domains")
                    .with_list_parse_key("crawler.extra_product_patterns")
                    .with_list_parse_key("browser.load_more_labels")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 从单个配置文件加载（仍然应用默认值与校验）
    pub fn from_file(path: &str) -> Result<Self, SettingsError> {
        let builder = Self::defaults(Config::builder())?.add_source(File::with_name(path));
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.key_prefix", "prodscout")?
            .set_default("crawler.domains", Vec::<String>::new())?
            .set_default("crawler.workers", 8)?
            .set_default("crawler.queue_backend", "redis")?
            .set_default("crawler.store_backend", "redis")?
            .set_default("crawler.poll_interval_ms", 500)?
            .set_default("crawler.visibility_timeout_secs", 300)?
            .set_default("crawler.extra_product_patterns", Vec::<String>::new())?
            .set_default("fetch.timeout_secs", 10)?
            .set_default(
                "fetch.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )?
            .set_default(
                "fetch.accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )?
            .set_default("fetch.accept_language", "en-US,en;q=0.5")?
            .set_default("browser.navigation_timeout_secs", 30)?
            .set_default("browser.settle_interval_ms", 1000)?
            .set_default("browser.load_more_settle_ms", 2000)?
            .set_default("browser.max_scroll_iterations", 20)?
            .set_default("browser.stable_height_readings", 3)?
            .set_default("browser.window_width", 1920)?
            .set_default("browser.window_height", 1080)?
            .set_default(
                "browser.load_more_labels",
                vec!["load more", "show more", "view more"],
            )?
            .set_default("retry.max_retries", 3)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_delay_ms", 60_000)?
            .set_default("retry.strategy", "linear")?
            .set_default("retry.jitter_factor", 0.0)?
            .set_default("rate_limiting.job_interval_ms", 2000)?
            .set_default("output.path", "crawled_urls.json")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .set_default("metrics.sample_interval_secs", 5)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
