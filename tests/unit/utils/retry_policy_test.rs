// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use prodscout::utils::retry_policy::{BackoffStrategy, RetryPolicy};
use std::time::Duration;

#[test]
fn test_exponential_backoff_sequence() {
    let policy = RetryPolicy {
        strategy: BackoffStrategy::Exponential,
        ..RetryPolicy::default()
    };
    let delays: Vec<Duration> = (1..=3).map(|n| policy.calculate_backoff(n)).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[test]
fn test_default_backoff_is_base_times_attempt() {
    let policy = RetryPolicy::default();
    let delays: Vec<Duration> = (1..=3).map(|n| policy.calculate_backoff(n)).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3)
        ]
    );
}

#[test]
fn test_attempt_budget() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts(), 4);
    let retries = (0..10).take_while(|attempt| policy.should_retry(*attempt)).count();
    assert_eq!(retries, 3);
}

#[test]
fn test_zero_retries_never_retries() {
    let policy = RetryPolicy {
        max_retries: 0,
        ..RetryPolicy::default()
    };
    assert!(!policy.should_retry(0));
    assert_eq!(policy.max_attempts(), 1);
}
