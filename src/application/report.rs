// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_metadata::DomainMetadata;
use crate::domain::models::domain_target::DomainTarget;
use crate::domain::repositories::crawl_store::CrawlStore;
use crate::utils::errors::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// 结果文件写入错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 结果汇总写入器
///
/// 以配置中的原始域名URL为键输出 `{name, urls}`。
/// 没有元数据的域名（失败或被中断）输出推导名称与空数组。
pub struct ReportWriter<S: CrawlStore> {
    store: S,
    path: PathBuf,
}

impl<S: CrawlStore> ReportWriter<S> {
    pub fn new(store: S, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 从存储汇总全部目标的结果
    pub async fn collect(
        &self,
        targets: &[DomainTarget],
    ) -> Result<BTreeMap<String, DomainMetadata>, StoreError> {
        let mut report = BTreeMap::new();
        for target in targets {
            let metadata = self
                .store
                .read_metadata(target.identity())
                .await?
                .unwrap_or_else(|| DomainMetadata::empty(target.name()));
            report.insert(target.url.clone(), metadata);
        }
        Ok(report)
    }

    /// 汇总并写入结果文件，返回写入的商品URL总数
    pub async fn write(&self, targets: &[DomainTarget]) -> Result<usize, ReportError> {
        let report = self.collect(targets).await?;
        let total: usize = report.values().map(|m| m.urls.len()).sum();

        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| ReportError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "Wrote {} product URLs for {} domains to {}",
            total,
            report.len(),
            self.path.display()
        );
        Ok(total)
    }
}
