// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化域名URL
///
/// 解析为绝对URL（scheme/host小写化、路径规范化），然后去掉末尾的一个斜杠。
/// 结果作为域名在队列与存储中的身份标识。
pub fn normalize_domain_url(raw: &str) -> Result<String, ParseError> {
    let url = Url::parse(raw.trim())?;
    let href = url.as_str();
    Ok(href.strip_suffix('/').unwrap_or(href).to_string())
}

/// 从域名URL推导简短名称
///
/// `https://www.example.com/shop` → `example`。
/// 无法解析或没有主机名时返回原始输入。
pub fn derive_domain_name(raw: &str) -> String {
    let host = match Url::parse(raw).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host,
        None => return raw.to_string(),
    };

    let host = host.strip_prefix("www.").unwrap_or(&host);
    host.split('.').next().unwrap_or(host).to_string()
}

/// 提取链接中的路径部分
///
/// 对绝对URL返回其path；对相对路径或缺少scheme的输入，去掉查询串和片段后原样返回。
pub fn link_path(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) if !url.cannot_be_a_base() => url.path().to_string(),
        _ => {
            let end = link.find(['?', '#']).unwrap_or(link.len());
            link[..end].to_string()
        }
    }
}
