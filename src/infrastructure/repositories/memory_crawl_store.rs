// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_metadata::DomainMetadata;
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::utils::errors::StoreError;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::collections::HashSet;

/// 进程内爬取存储
///
/// 语义与Redis实现一致，用于 `memory` 后端和测试
#[derive(Default)]
pub struct MemoryCrawlStore {
    visited: DashSet<String>,
    product_urls: DashMap<String, HashSet<String>>,
    metadata: DashMap<String, DomainMetadata>,
}

impl MemoryCrawlStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrawlStore for MemoryCrawlStore {
    async fn clear_all(&self) -> Result<(), StoreError> {
        self.visited.clear();
        self.product_urls.clear();
        self.metadata.clear();
        Ok(())
    }

    async fn is_visited(&self, domain: &str) -> Result<bool, StoreError> {
        Ok(self.visited.contains(domain))
    }

    async fn mark_visited(&self, domain: &str) -> Result<bool, StoreError> {
        Ok(self.visited.insert(domain.to_string()))
    }

    async fn unmark_visited(&self, domain: &str) -> Result<bool, StoreError> {
        Ok(self.visited.remove(domain).is_some())
    }

    async fn add_product_urls(
        &self,
        domain: &str,
        urls: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        let mut entry = self.product_urls.entry(domain.to_string()).or_default();
        let before = entry.len();
        entry.extend(urls.iter().cloned());
        Ok(entry.len() - before)
    }

    async fn product_urls(&self, domain: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .product_urls
            .get(domain)
            .map(|urls| urls.clone())
            .unwrap_or_default())
    }

    async fn write_metadata(
        &self,
        domain: &str,
        metadata: &DomainMetadata,
    ) -> Result<(), StoreError> {
        self.metadata.insert(domain.to_string(), metadata.clone());
        Ok(())
    }

    async fn read_metadata(&self, domain: &str) -> Result<Option<DomainMetadata>, StoreError> {
        Ok(self.metadata.get(domain).map(|m| m.clone()))
    }
}
