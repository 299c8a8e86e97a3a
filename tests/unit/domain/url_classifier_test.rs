// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use prodscout::domain::services::url_classifier::{
    has_product_marker, is_product_url, ProductUrlClassifier, DEFAULT_PRODUCT_PATTERNS,
};

#[test]
fn test_storefront_examples() {
    assert!(is_product_url("https://store.example.com/products/42"));
    assert!(is_product_url("https://www.amazon.com/dp/B08J5F3G18?ref=x"));
    assert!(is_product_url("/item/777"));

    assert!(!is_product_url("https://store.example.com/about"));
    assert!(!is_product_url("https://store.example.com/cart"));
    assert!(!is_product_url("https://www.amazon.com/dp/lowercase"));
    assert!(!is_product_url(""));
}

#[test]
fn test_query_and_fragment_do_not_count() {
    assert!(!is_product_url("https://example.com/search?next=/product/1"));
    assert!(!is_product_url("https://example.com/home#/product/1"));
}

#[test]
fn test_extra_patterns_only_widen_matches() {
    let links = [
        "https://example.com/product/1",
        "https://example.com/artikel/55",
        "https://example.com/contact",
        "/catalog/product/9",
    ];
    let base = ProductUrlClassifier::default();
    let extended = ProductUrlClassifier::with_extra_patterns(&["/artikel/[0-9]+"]).unwrap();

    assert_eq!(
        extended.pattern_count(),
        DEFAULT_PRODUCT_PATTERNS.len() + 1
    );
    for link in links {
        if base.is_product_url(link) {
            assert!(extended.is_product_url(link), "{}", link);
        }
    }
    assert!(!base.is_product_url("https://example.com/artikel/55"));
    assert!(extended.is_product_url("https://example.com/artikel/55"));
}

#[test]
fn test_dynamic_markers_are_product_urls() {
    let rendered = [
        "https://example.com/p/123",
        "https://example.com/dp/B0001",
        "https://example.com/products/123",
        "https://example.com/product/9",
    ];
    for link in rendered {
        assert!(has_product_marker(link), "{}", link);
        assert!(is_product_url(link), "{}", link);
    }
    assert!(!has_product_marker("https://example.com/item/5"));
}
