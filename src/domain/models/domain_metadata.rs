// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 域名元数据
///
/// 域名爬取成功时写入一次，最终汇总时读取一次；重试后再次成功会覆盖。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMetadata {
    /// 简短域名标签
    pub name: String,
    /// 发现的商品URL，输出时按字典序排列
    pub urls: Vec<String>,
}

impl DomainMetadata {
    pub fn new(name: impl Into<String>, urls: &HashSet<String>) -> Self {
        let mut urls: Vec<String> = urls.iter().cloned().collect();
        urls.sort();
        Self {
            name: name.into(),
            urls,
        }
    }

    /// 失败域名在结果文件中的占位条目
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            urls: Vec::new(),
        }
    }
}
