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

#[tokio::test]
async fn test_empty_domain_fails_after_all_retries() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawled_urls.json");
    let domain = "https://empty.example.com";
    let settings = test_settings(&[domain], 1, &output);

    let store = Arc::new(MemoryCrawlStore::new());
    let static_extractor = ScriptedExtractor::new();
    let dynamic_extractor = ScriptedExtractor::new();

    let session = CrawlSession::new(
        settings,
        store.clone(),
        Arc::new(InMemoryJobQueue::new(Duration::from_secs(60))),
        static_extractor.clone(),
        dynamic_extractor.clone(),
    )
    .unwrap();
    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert!(summary.is_drained());
    assert_eq!(summary.failed, vec![domain.to_string()]);
    assert!(summary.completed.is_empty());
    assert_eq!(summary.retries, 3);

    // 首次执行 + 3次重试
    assert_eq!(static_extractor.calls(domain), 4);
    assert_eq!(dynamic_extractor.calls(domain), 4);

    assert!(!store.is_visited(domain).await.unwrap());
    assert!(store.product_urls(domain).await.unwrap().is_empty());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report[domain]["name"], "empty");
    assert_eq!(report[domain]["urls"], serde_json::json!([]));
}

#[tokio::test]
async fn test_retry_recovers_once_links_appear() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawled_urls.json");
    let good = "https://good.example.com";
    let empty = "https://empty.example.com";
    let settings = test_settings(&[good, empty], 2, &output);

    let store = Arc::new(MemoryCrawlStore::new());
    let static_extractor =
        ScriptedExtractor::new().with_links(good, &["https://good.example.com/product/1"]);

    let session = CrawlSession::new(
        settings,
        store.clone(),
        Arc::new(InMemoryJobQueue::new(Duration::from_secs(60))),
        static_extractor.clone(),
        ScriptedExtractor::new(),
    )
    .unwrap();
    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert_eq!(summary.completed, vec![good.to_string()]);
    assert_eq!(summary.failed, vec![empty.to_string()]);
    assert_eq!(static_extractor.calls(good), 1);
    assert_eq!(static_extractor.calls(empty), 4);
    assert!(store.is_visited(good).await.unwrap());
    assert!(!store.is_visited(empty).await.unwrap());
}
