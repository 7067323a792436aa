#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static SHOP_DOMAIN: Lazy<String> =
    Lazy::new(|| env::var("SHOP_DOMAIN").unwrap_or_default());

pub static ADMIN_TOKEN: Lazy<String> =
    Lazy::new(|| env::var("SHOP_ADMIN_TOKEN").unwrap_or_default());

pub static API_VERSION: Lazy<String> =
    Lazy::new(|| env::var("SHOP_API_VERSION").unwrap_or_else(|_| "2024-10".to_string()));

pub static FEED_URL_EN: Lazy<String> =
    Lazy::new(|| env::var("FEED_URL_EN").unwrap_or_default());

pub static FEED_URL_FI: Lazy<String> =
    Lazy::new(|| env::var("FEED_URL_FI").unwrap_or_default());

/// Feed URLs to import, in order. Empty entries are skipped so a run can be
/// limited to one language via the environment.
pub fn feed_urls() -> Vec<String> {
    [FEED_URL_EN.clone(), FEED_URL_FI.clone()]
        .into_iter()
        .filter(|url| !url.trim().is_empty())
        .collect()
}

pub fn pacing() -> Duration {
    let ms = env::var("REMOTE_PACING_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(500);
    Duration::from_millis(ms)
}

pub fn attach_max_attempts() -> u32 {
    env::var("ATTACH_MAX_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(5)
}

pub fn attach_backoff() -> Duration {
    let ms = env::var("ATTACH_BACKOFF_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(2000);
    Duration::from_millis(ms)
}
