// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{test_settings, FixedPageRenderer, ScriptedExtractor};
use prodscout::application::use_cases::crawl_session::CrawlSession;
use prodscout::domain::repositories::crawl_store::CrawlStore;
use prodscout::domain::services::url_classifier::ProductUrlClassifier;
use prodscout::engines::dynamic_extractor::DynamicExtractor;
use prodscout::engines::reqwest_engine::ReqwestEngine;
use prodscout::engines::scroll_discovery::{ScrollDiscovery, ScrollSettings};
use prodscout::engines::static_extractor::StaticExtractor;
use prodscout::infrastructure::repositories::memory_crawl_store::MemoryCrawlStore;
use prodscout::queue::memory_queue::InMemoryJobQueue;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHOP_PAGE: &str = r#"
<html><body>
    <a href="/products/123">Widget</a>
    <a href="/products/456">Gadget</a>
    <a href="/about">About us</a>
    <a href="/cart">Cart</a>
</body></html>
"#;

#[tokio::test]
async fn test_end_to_end_shop_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_PAGE))
        .mount(&server)
        .await;

    let base = server.uri();
    let domain = format!("{}/shop", base);
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawled_urls.json");
    let settings = test_settings(&[&domain], 2, &output);

    let store = Arc::new(MemoryCrawlStore::new());
    let static_extractor = StaticExtractor::new(
        ReqwestEngine::new("prodscout-test"),
        Arc::new(ProductUrlClassifier::default()),
        HashMap::new(),
        Duration::from_secs(5),
    );
    let renderer = FixedPageRenderer::new(&[
        format!("{}/products/456", base),
        format!("{}/products/789", base),
        format!("{}/cart", base),
    ]);
    let closed_sessions = renderer.closed_sessions();
    let dynamic_extractor = DynamicExtractor::new(
        renderer,
        ScrollDiscovery::new(ScrollSettings {
            settle_interval: Duration::from_millis(1),
            load_more_settle: Duration::from_millis(1),
            ..ScrollSettings::default()
        }),
        Duration::from_secs(5),
    );

    let session = CrawlSession::new(
        settings,
        store.clone(),
        Arc::new(InMemoryJobQueue::new(Duration::from_secs(60))),
        Arc::new(static_extractor),
        Arc::new(dynamic_extractor),
    )
    .unwrap();
    let summary = session.run_until(std::future::pending()).await.unwrap();

    assert!(summary.is_drained());
    assert_eq!(closed_sessions.load(Ordering::SeqCst), 1);
    assert_eq!(summary.completed.len(), 1);
    assert!(summary.failed.is_empty());

    let identity = domain.as_str();
    let expected: HashSet<String> = ["123", "456", "789"]
        .iter()
        .map(|id| format!("{}/products/{}", base, id))
        .collect();
    assert_eq!(store.product_urls(identity).await.unwrap(), expected);
    assert!(store.is_visited(identity).await.unwrap());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let entry = &report[domain.as_str()];
    assert_eq!(entry["urls"].as_array().unwrap().len(), 3);
    assert_eq!(entry["name"], "127");
}

#[tokio::test]
async fn test_report_written_when_interrupted() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawled_urls.json");
    let settings = test_settings(&["https://slow.example.com"], 1, &output);
    let store = Arc::new(MemoryCrawlStore::new());

    let session = CrawlSession::new(
        settings,
        store,
        Arc::new(InMemoryJobQueue::new(Duration::from_secs(60))),
        ScriptedExtractor::new(),
        ScriptedExtractor::new(),
    )
    .unwrap();
    let summary = session
        .run_until(std::future::ready(()))
        .await
        .unwrap();

    assert_eq!(summary.unresolved, vec!["https://slow.example.com"]);
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["https://slow.example.com"]["name"], "slow");
    assert_eq!(
        report["https://slow.example.com"]["urls"],
        serde_json::json!([])
    );
}
