// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils;
use once_cell::sync::Lazy;
use regex::Regex;

/// 商品详情页路径模式
///
/// 新的店铺URL约定只需在此追加一条。模式之间相互独立，任一匹配即为商品链接。
pub const DEFAULT_PRODUCT_PATTERNS: &[&str] = &[
    r"/product/",
    r"/item/",
    r"/p/",
    r"/products?/",
    r"/dp/[A-Z0-9]+",
    r"/gp/product/[A-Z0-9]+",
    r"/prod/",
    r"/detail/",
    r"/details/",
    r"/sku/",
    r"/buy/",
    r"/store/products?/",
    r"/catalog/product/",
    r"/shop/",
    r"/product-page/",
    r"/view/[A-Za-z0-9_-]+",
    r"/goods/[0-9]+",
    r"/offer/",
];

/// 渲染页面锚点过滤使用的规范商品路径标记（子串匹配完整URL）
pub const DYNAMIC_PRODUCT_MARKERS: &[&str] = &["/product/", "/products/", "/dp/", "/p/"];

static DEFAULT_CLASSIFIER: Lazy<ProductUrlClassifier> = Lazy::new(ProductUrlClassifier::default);

/// 判断链接是否为商品详情页URL（使用默认模式）
pub fn is_product_url(link: &str) -> bool {
    DEFAULT_CLASSIFIER.is_product_url(link)
}

/// 判断渲染页面中的锚点URL是否包含规范商品路径标记
pub fn has_product_marker(url: &str) -> bool {
    DYNAMIC_PRODUCT_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
}

/// 商品URL分类器
///
/// 纯结构判断：只检查链接的路径部分，不访问网络，也不会因输入异常而失败。
#[derive(Debug, Clone)]
pub struct ProductUrlClassifier {
    patterns: Vec<Regex>,
}

impl Default for ProductUrlClassifier {
    fn default() -> Self {
        let patterns = DEFAULT_PRODUCT_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("built-in product pattern must compile"))
            .collect();
        Self { patterns }
    }
}

impl ProductUrlClassifier {
    /// 创建不含任何模式的分类器
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// 在默认模式基础上追加额外模式
    ///
    /// # 返回值
    ///
    /// * `Err(regex::Error)` - 某个模式不是合法正则
    pub fn with_extra_patterns<S: AsRef<str>>(extra: &[S]) -> Result<Self, regex::Error> {
        let mut classifier = Self::default();
        for pattern in extra {
            classifier.register(pattern.as_ref())?;
        }
        Ok(classifier)
    }

    /// 注册一个新的路径模式
    pub fn register(&mut self, pattern: &str) -> Result<(), regex::Error> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(())
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_product_url(&self, link: &str) -> bool {
        let path = url_utils::link_path(link);
        if path.is_empty() {
            return false;
        }
        self.patterns.iter().any(|pattern| pattern.is_match(&path))
    }
}
