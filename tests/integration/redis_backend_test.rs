// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::start_redis;
use prodscout::domain::models::crawl_job::CrawlJob;
use prodscout::domain::models::domain_metadata::DomainMetadata;
use prodscout::domain::models::domain_target::DomainTarget;
use prodscout::domain::repositories::crawl_store::CrawlStore;
use prodscout::infrastructure::repositories::redis_crawl_store::RedisCrawlStore;
use prodscout::queue::task_queue::{JobQueue, RedisJobQueue};
use std::collections::HashSet;
use std::time::Duration;

fn job(url: &str) -> CrawlJob {
    CrawlJob::new(DomainTarget::parse(url).unwrap())
}

fn urls(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_redis_queue_dedups_by_identity() {
    let Some(redis) = start_redis().await else {
        return;
    };
    let queue = RedisJobQueue::new(redis.client.clone(), &redis.prefix, Duration::from_secs(60));

    assert!(queue.submit(job("https://a.com")).await.unwrap());
    assert!(!queue.submit(job("https://a.com/")).await.unwrap());
    assert!(queue.submit(job("https://b.com")).await.unwrap());
    assert_eq!(queue.outstanding().await.unwrap(), 2);

    let first = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(first.identity(), "https://a.com");
    assert_eq!(first.attempt, 0);
    // Still outstanding while active.
    assert!(!queue.submit(job("https://a.com")).await.unwrap());

    queue.complete("https://a.com").await.unwrap();
    assert_eq!(queue.outstanding().await.unwrap(), 1);
    assert!(queue.submit(job("https://a.com")).await.unwrap());
}

#[tokio::test]
async fn test_redis_retry_is_promoted_once_due() {
    let Some(redis) = start_redis().await else {
        return;
    };
    let queue = RedisJobQueue::new(redis.client.clone(), &redis.prefix, Duration::from_secs(60));
    queue.submit(job("https://a.com")).await.unwrap();
    let first = queue.dequeue().await.unwrap().unwrap();

    queue
        .retry(&first.next_attempt(), Duration::from_millis(300))
        .await
        .unwrap();
    assert!(queue.dequeue().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(400)).await;
    let retried = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(retried.identity(), "https://a.com");
    assert_eq!(retried.attempt, 1);

    // Promoted exactly once.
    assert!(queue.dequeue().await.unwrap().is_none());
    assert_eq!(queue.outstanding().await.unwrap(), 1);
}

#[tokio::test]
async fn test_redis_stalled_job_is_redelivered() {
    let Some(redis) = start_redis().await else {
        return;
    };
    let queue = RedisJobQueue::new(
        redis.client.clone(),
        &redis.prefix,
        Duration::from_millis(300),
    );
    queue.submit(job("https://a.com")).await.unwrap();
    queue.dequeue().await.unwrap().unwrap();
    assert!(queue.dequeue().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(400)).await;
    let redelivered = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(redelivered.identity(), "https://a.com");
    assert_eq!(redelivered.attempt, 0);
    assert!(queue.dequeue().await.unwrap().is_none());

    queue.fail("https://a.com").await.unwrap();
    assert_eq!(queue.outstanding().await.unwrap(), 0);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(queue.dequeue().await.unwrap().is_none());
}

#[tokio::test]
async fn test_redis_store_visited_and_product_sets() {
    let Some(redis) = start_redis().await else {
        return;
    };
    let store = RedisCrawlStore::new(redis.client.clone(), &redis.prefix);

    assert!(!store.is_visited("https://a.com").await.unwrap());
    assert!(store.mark_visited("https://a.com").await.unwrap());
    assert!(!store.mark_visited("https://a.com").await.unwrap());
    assert!(store.is_visited("https://a.com").await.unwrap());
    assert!(store.unmark_visited("https://a.com").await.unwrap());
    assert!(!store.unmark_visited("https://a.com").await.unwrap());

    let added = store
        .add_product_urls("https://a.com", &urls(&["u1", "u2"]))
        .await
        .unwrap();
    let again = store
        .add_product_urls("https://a.com", &urls(&["u2", "u3"]))
        .await
        .unwrap();
    assert_eq!(added, 2);
    assert_eq!(again, 1);
    assert_eq!(
        store.product_urls("https://a.com").await.unwrap(),
        urls(&["u1", "u2", "u3"])
    );
    assert!(store.product_urls("https://b.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_redis_metadata_roundtrip_and_scoped_clear() {
    let Some(redis) = start_redis().await else {
        return;
    };
    let store = RedisCrawlStore::new(redis.client.clone(), &redis.prefix);
    let neighbour = RedisCrawlStore::new(redis.client.clone(), format!("{}-other", redis.prefix));

    assert!(store.read_metadata("https://a.com").await.unwrap().is_none());
    let metadata = DomainMetadata::new("a", &urls(&["https://a.com/p/2", "https://a.com/p/1"]));
    store.write_metadata("https://a.com", &metadata).await.unwrap();
    assert_eq!(
        store.read_metadata("https://a.com").await.unwrap(),
        Some(metadata)
    );

    store.mark_visited("https://a.com").await.unwrap();
    store
        .add_product_urls("https://a.com", &urls(&["https://a.com/p/1"]))
        .await
        .unwrap();
    neighbour.mark_visited("https://a.com").await.unwrap();

    store.clear_all().await.unwrap();

    assert!(!store.is_visited("https://a.com").await.unwrap());
    assert!(store.product_urls("https://a.com").await.unwrap().is_empty());
    assert!(store.read_metadata("https://a.com").await.unwrap().is_none());
    assert!(neighbour.is_visited("https://a.com").await.unwrap());
}
