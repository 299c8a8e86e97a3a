// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::ParseError;

/// 爬取目标域名
///
/// 由静态配置创建，不可变。`url` 保留配置中的原始写法（用于结果文件的键），
/// `identity` 是规范化后的URL，用于队列去重与存储键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainTarget {
    /// 配置中的原始URL
    pub url: String,
    /// 规范化URL（身份标识）
    identity: String,
}

impl DomainTarget {
    /// 从原始URL创建目标
    ///
    /// # 返回值
    ///
    /// * `Ok(DomainTarget)` - 解析成功
    /// * `Err(ParseError)` - 不是合法的绝对URL
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let identity = url_utils::normalize_domain_url(raw)?;
        Ok(Self {
            url: raw.trim().to_string(),
            identity,
        })
    }

    /// 规范化后的身份标识
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// 推导出的简短名称，例如 `https://www.example.com` → `example`
    pub fn name(&self) -> String {
        url_utils::derive_domain_name(&self.identity)
    }
}

impl fmt::Display for DomainTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.identity)
    }
}
