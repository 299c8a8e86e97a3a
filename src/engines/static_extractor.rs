// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::url_classifier::ProductUrlClassifier;
use crate::engines::traits::{EngineError, FetchRequest, LinkExtractor, PageFetcher};
use crate::utils::url_utils;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector must parse"));
static BASE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("base[href]").expect("base selector must parse"));

/// 静态页面提取器
///
/// 抓取原始HTML，解析全部锚点，解析为绝对URL后用分类器过滤
pub struct StaticExtractor<F: PageFetcher> {
    fetcher: F,
    classifier: Arc<ProductUrlClassifier>,
    headers: HashMap<String, String>,
    timeout: Duration,
}

impl<F: PageFetcher> StaticExtractor<F> {
    pub fn new(
        fetcher: F,
        classifier: Arc<ProductUrlClassifier>,
        headers: HashMap<String, String>,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            headers,
            timeout,
        }
    }
}

/// 从HTML中提取商品链接
///
/// 存在 `<base href>` 时以其为基准URL。纯片段链接和非http(s)链接被忽略，
/// 结果URL去掉片段后按字符串去重。
pub fn extract_product_links(
    html: &str,
    page_url: &Url,
    classifier: &ProductUrlClassifier,
) -> HashSet<String> {
    let document = Html::parse_document(html);

    let base = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| url_utils::resolve_url(page_url, href).ok())
        .unwrap_or_else(|| page_url.clone());

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| url_utils::resolve_url(&base, href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .filter(|url| classifier.is_product_url(url))
        .collect()
}

#[async_trait]
impl<F: PageFetcher> LinkExtractor for StaticExtractor<F> {
    async fn extract(&self, page_url: &str) -> Result<HashSet<String>, EngineError> {
        let page = Url::parse(page_url).map_err(|e| EngineError::InvalidUrl {
            url: page_url.to_string(),
            reason: e.to_string(),
        })?;

        let request = FetchRequest {
            url: page.to_string(),
            headers: self.headers.clone(),
            timeout: self.timeout,
        };

        let response = match self.fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(
                    "Error scraping static page {}: {}",
                    page_url,
                    EngineError::HttpStatus(response.status_code)
                );
                return Ok(HashSet::new());
            }
            Err(e) if e.is_recoverable() => {
                warn!("Error scraping static page {}: {}", page_url, e);
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e),
        };

        let base = Url::parse(&response.final_url).unwrap_or(page);
        let links = extract_product_links(&response.content, &base, &self.classifier);
        debug!(
            "Static extractor found {} product links on {} ({}ms)",
            links.len(),
            page_url,
            response.response_time_ms
        );
        Ok(links)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
