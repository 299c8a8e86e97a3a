// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{test_settings, ScriptedExtractor};
use prodscout::application::use_cases::crawl_session::CrawlSession;
use prodscout::domain::repositories::crawl_store::CrawlStore;
use prodscout::infrastructure::repositories::memory_crawl_store::MemoryCrawlStore;
use prodscout::queue::memory_queue::InMemoryJobQueue;
use std::sync::Arc;
use std::time::Duration;

const DOMAINS: &[&str] = &[
    "https://alpha.example.com",
    "https://beta.example.com",
    "https://gamma.example.com",
    "https://delta.example.com",
    "https://epsilon.example.com",
];

fn scripted_catalog() -> Arc<ScriptedExtractor> {
    DOMAINS.iter().fold(ScriptedExtractor::new(), |ex, domain| {
        let link = format!("{}/product/1", domain);
        ex.with_links(domain, &[link.as_str()])
    })
}

#[tokio::test]
async fn test_each_domain_is_crawled_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawled_urls.json");

    // 重复的域名只会提交一次
    let mut configured: Vec<&str> = DOMAINS.to_vec();
    configured.push("https://alpha.example.com/");
    let settings = test_settings(&configured, 3, &output);

    let store = Arc::new(MemoryCrawlStore::new());
    let static_extractor = scripted_catalog();
    let session = CrawlSession::new(
        settings,
        store.clone(),
        Arc::new(InMemoryJobQueue::new(Duration::from_secs(60))),
        static_extractor.clone(),
        ScriptedExtractor::new(),
    )
    .unwrap();
    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert!(summary.is_drained());
    assert_eq!(summary.total, DOMAINS.len());
    assert_eq!(summary.completed.len(), DOMAINS.len());
    assert!(summary.failed.is_empty());
    assert_eq!(summary.retries, 0);
    assert_eq!(static_extractor.total_calls(), DOMAINS.len());

    for domain in DOMAINS {
        assert_eq!(static_extractor.calls(domain), 1, "{}", domain);
        assert!(store.is_visited(domain).await.unwrap());
        assert_eq!(store.product_urls(domain).await.unwrap().len(), 1);
    }

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["https://gamma.example.com"]["name"], "gamma");
}

#[tokio::test]
async fn test_single_worker_drains_queue() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawled_urls.json");
    let settings = test_settings(DOMAINS, 1, &output);

    let session = CrawlSession::new(
        settings,
        Arc::new(MemoryCrawlStore::new()),
        Arc::new(InMemoryJobQueue::new(Duration::from_secs(60))),
        scripted_catalog(),
        ScriptedExtractor::new(),
    )
    .unwrap();
    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert_eq!(summary.completed.len(), DOMAINS.len());
    assert!(summary.unresolved.is_empty());
}
