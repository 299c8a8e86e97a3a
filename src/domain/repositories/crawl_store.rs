// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_metadata::DomainMetadata;
use crate::utils::errors::StoreError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// 访问记录与结果存储
///
/// 所有 `domain` 参数都是规范化后的域名身份标识。每个爬取任务只读写自己域名的键，
/// 因此不存在跨域名竞争；"检查已访问再标记"两步之间不是原子的，由队列的身份去重保证。
#[async_trait]
pub trait CrawlStore: Send + Sync {
    /// 清空本次会话的全部数据（会话开始时调用一次）
    async fn clear_all(&self) -> Result<(), StoreError>;

    /// 域名是否已标记为已访问
    async fn is_visited(&self, domain: &str) -> Result<bool, StoreError>;

    /// 标记已访问，返回是否为新标记
    async fn mark_visited(&self, domain: &str) -> Result<bool, StoreError>;

    /// 移除已访问标记，返回标记此前是否存在
    async fn unmark_visited(&self, domain: &str) -> Result<bool, StoreError>;

    /// 向域名的商品URL集合添加元素，返回新增数量
    async fn add_product_urls(
        &self,
        domain: &str,
        urls: &HashSet<String>,
    ) -> Result<usize, StoreError>;

    /// 读取域名的商品URL集合
    async fn product_urls(&self, domain: &str) -> Result<HashSet<String>, StoreError>;

    /// 写入（覆盖）域名元数据
    async fn write_metadata(&self, domain: &str, metadata: &DomainMetadata)
        -> Result<(), StoreError>;

    /// 读取域名元数据
    async fn read_metadata(&self, domain: &str) -> Result<Option<DomainMetadata>, StoreError>;
}

#[async_trait]
impl<T: CrawlStore + ?Sized> CrawlStore for Arc<T> {
    async fn clear_all(&self) -> Result<(), StoreError> {
        (**self).clear_all().await
    }

    async fn is_visited(&self, domain: &str) -> Result<bool, StoreError> {
        (**self).is_visited(domain).await
    }

    async fn mark_visited(&self, domain: &str) -> Result<bool, StoreError> {
        (**self).mark_visited(domain).await
    }

    async fn unmark_visited(&self, domain: &str) -> Result<bool, StoreError> {
        (**self).unmark_visited(domain).await
    }

    async fn add_product_urls(
        &self,
        domain: &str,
        urls: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        (**self).add_product_urls(domain, urls).await
    }

    async fn product_urls(&self, domain: &str) -> Result<HashSet<String>, StoreError> {
        (**self).product_urls(domain).await
    }

    async fn write_metadata(
        &self,
        domain: &str,
        metadata: &DomainMetadata,
    ) -> Result<(), StoreError> {
        (**self).write_metadata(domain, metadata).await
    }

    async fn read_metadata(&self, domain: &str) -> Result<Option<DomainMetadata>, StoreError> {
        (**self).read_metadata(domain).await
    }
}
