// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use prodscout::domain::models::domain_target::DomainTarget;
use prodscout::utils::url_utils::{derive_domain_name, normalize_domain_url};

#[test]
fn test_equivalent_spellings_share_identity() {
    let spellings = [
        "https://shop.example.com/",
        "https://shop.example.com",
        "HTTPS://Shop.Example.com",
        "  https://shop.example.com/  ",
    ];
    for raw in spellings {
        assert_eq!(
            normalize_domain_url(raw).unwrap(),
            "https://shop.example.com",
            "{}",
            raw
        );
    }
}

#[test]
fn test_target_keeps_configured_spelling() {
    let target = DomainTarget::parse("https://www.Example.com/").unwrap();
    assert_eq!(target.url, "https://www.Example.com/");
    assert_eq!(target.identity(), "https://www.example.com");
    assert_eq!(target.name(), "example");
    assert_eq!(target.to_string(), "https://www.example.com");
}

#[test]
fn test_name_of_bare_host() {
    assert_eq!(derive_domain_name("https://etsy.com"), "etsy");
    assert_eq!(derive_domain_name("http://localhost"), "localhost");
}
