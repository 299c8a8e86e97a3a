// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_metadata::DomainMetadata;
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::infrastructure::cache::redis_client::RedisClient;
use crate::utils::errors::StoreError;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::info;

/// 基于Redis的爬取存储
///
/// 键布局（`{prefix}` 为配置的命名空间）：
/// - `{prefix}:visited` - 已访问域名集合
/// - `{prefix}:product_urls:{domain}` - 域名商品URL集合
/// - `{prefix}:domain:{domain}` - 域名元数据哈希 {name, urls(JSON数组)}
pub struct RedisCrawlStore {
    redis: RedisClient,
    prefix: String,
}

impl RedisCrawlStore {
    pub fn new(redis: RedisClient, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn visited_key(&self) -> String {
        format!("{}:visited", self.prefix)
    }

    fn product_urls_key(&self, domain: &str) -> String {
        format!("{}:product_urls:{}", self.prefix, domain)
    }

    fn metadata_key(&self, domain: &str) -> String {
        format!("{}:domain:{}", self.prefix, domain)
    }
}

#[async_trait]
impl CrawlStore for RedisCrawlStore {
    async fn clear_all(&self) -> Result<(), StoreError> {
        let removed = self
            .redis
            .delete_matching(&format!("{}:*", self.prefix))
            .await?;
        info!("Cleared {} keys under namespace '{}'", removed, self.prefix);
        Ok(())
    }

    async fn is_visited(&self, domain: &str) -> Result<bool, StoreError> {
        Ok(self.redis.sismember(&self.visited_key(), domain).await?)
    }

    async fn mark_visited(&self, domain: &str) -> Result<bool, StoreError> {
        let added = self
            .redis
            .sadd(&self.visited_key(), &[domain.to_string()])
            .await?;
        Ok(added > 0)
    }

    async fn unmark_visited(&self, domain: &str) -> Result<bool, StoreError> {
        let removed = self.redis.srem(&self.visited_key(), domain).await?;
        Ok(removed > 0)
    }

    async fn add_product_urls(
        &self,
        domain: &str,
        urls: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        let members: Vec<String> = urls.iter().cloned().collect();
        Ok(self
            .redis
            .sadd(&self.product_urls_key(domain), &members)
            .await?)
    }

    async fn product_urls(&self, domain: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self.redis.smembers(&self.product_urls_key(domain)).await?)
    }

    async fn write_metadata(
        &self,
        domain: &str,
        metadata: &DomainMetadata,
    ) -> Result<(), StoreError> {
        let urls = serde_json::to_string(&metadata.urls)?;
        self.redis
            .hset_multiple(
                &self.metadata_key(domain),
                &[("name", metadata.name.clone()), ("urls", urls)],
            )
            .await?;
        Ok(())
    }

    async fn read_metadata(&self, domain: &str) -> Result<Option<DomainMetadata>, StoreError> {
        let key = self.metadata_key(domain);
        let fields = self.redis.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let name = fields.get("name").cloned().ok_or_else(|| StoreError::Corrupted {
            key: key.clone(),
            reason: "missing field 'name'".to_string(),
        })?;
        let urls = match fields.get("urls") {
            Some(raw) => serde_json::from_str(raw)?,
            None => Vec::new(),
        };

        Ok(Some(DomainMetadata { name, urls }))
    }
}
