// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use prodscout::application::use_cases::crawl_session::CrawlSession;
use prodscout::config::settings::Settings;
use prodscout::utils::telemetry;
use tracing::info;

/// 主函数
///
/// 应用程序入口点：加载配置，连接存储与队列，运行一次完整的爬取会话
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // 2. Initialize logging
    telemetry::init_telemetry();
    info!("Starting prodscout...");

    // 3. Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: {} domains, {} workers",
        settings.crawler.domains.len(),
        settings.crawler.workers
    );

    // 4. Connect backends and run
    let session = CrawlSession::from_settings(settings).await?;
    let summary = session.run().await?;

    info!(
        "Done: {}/{} domains completed",
        summary.completed.len(),
        summary.total
    );
    Ok(())
}
