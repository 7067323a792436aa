//! Retry coordination for attach operations.
//!
//! The remote platform keeps ingesting an uploaded asset for a while after
//! the upload call returns, so attach calls can fail with a transient
//! "still processing" condition. Retries use a linear backoff
//! (`attempt * backoff_unit`) to bound the worst-case wait; rate-limit
//! responses get a fixed cooldown instead.

use super::cache::UploadedImage;
use crate::config;
use crate::shopify::client::CatalogApi;
use crate::shopify::error::ClientError;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Failure marker reported when every attach shape has been exhausted.
pub const ALL_METHODS_FAILED: &str = "all_methods_failed";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_unit: Duration::from_millis(2000),
            rate_limit_cooldown: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        Self {
            max_attempts: config::attach_max_attempts(),
            backoff_unit: config::attach_backoff(),
            ..Self::default()
        }
    }

    /// Zero-delay policy for tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: 5,
            backoff_unit: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
        }
    }
}

/// The three attach shapes, tried in order. Platform capabilities vary by
/// object maturity; the first shape that echoes a populated reference wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMethod {
    AppendMedia,
    BulkUpdate,
    SingleUpdate,
}

impl AttachMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AttachMethod::AppendMedia => "append_media",
            AttachMethod::BulkUpdate => "bulk_update",
            AttachMethod::SingleUpdate => "single_update",
        }
    }
}

#[derive(Debug)]
pub enum AttachOutcome {
    Attached { method: AttachMethod, attempts: u32 },
    /// The platform reported the image as already attached; an idempotent
    /// no-op, not a failure.
    AlreadyAttached,
    Failed { method: &'static str, error: ClientError },
}

fn methods_for(image: &UploadedImage) -> Vec<AttachMethod> {
    if image.media_id.is_some() {
        vec![
            AttachMethod::AppendMedia,
            AttachMethod::BulkUpdate,
            AttachMethod::SingleUpdate,
        ]
    } else {
        vec![AttachMethod::BulkUpdate, AttachMethod::SingleUpdate]
    }
}

/// Attach an image to a variant, walking the method chain with bounded
/// retries on transient errors.
pub async fn attach_image_to_variant<C: CatalogApi>(
    client: &C,
    policy: &RetryPolicy,
    product_id: &str,
    variant_id: &str,
    image: &UploadedImage,
) -> AttachOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error: Option<ClientError> = None;

    for attempt in 1..=max_attempts {
        let mut retry_after: Option<Duration> = None;

        for method in methods_for(image) {
            let result = match method {
                AttachMethod::AppendMedia => {
                    client
                        .append_variant_media(
                            product_id,
                            variant_id,
                            image.media_id.as_deref().unwrap_or_default(),
                        )
                        .await
                }
                AttachMethod::BulkUpdate => {
                    client
                        .bulk_update_variant_image(product_id, variant_id, &image.image_id)
                        .await
                }
                AttachMethod::SingleUpdate => {
                    client.update_variant_image(variant_id, &image.image_id).await
                }
            };

            match result {
                Ok(echo) if echo.is_populated() => {
                    debug!(
                        target = "feedsync.assign",
                        variant_id = variant_id,
                        method = method.as_str(),
                        attempts = attempt,
                        "variant_image_attached"
                    );
                    return AttachOutcome::Attached {
                        method,
                        attempts: attempt,
                    };
                }
                Ok(_) => {
                    last_error = Some(ClientError::Request(format!(
                        "{} echoed no attached reference",
                        method.as_str()
                    )));
                }
                Err(err) if err.is_conflict() => return AttachOutcome::AlreadyAttached,
                Err(ClientError::RateLimited) => {
                    retry_after = Some(policy.rate_limit_cooldown);
                    last_error = Some(ClientError::RateLimited);
                    break;
                }
                Err(err @ ClientError::NotReady(_)) => {
                    // the asset is not ready for any shape, stop the chain
                    retry_after = Some(policy.backoff_unit * attempt);
                    last_error = Some(err);
                    break;
                }
                Err(err) => {
                    last_error = Some(err);
                }
            }
        }

        match retry_after {
            Some(delay) if attempt < max_attempts => {
                warn!(
                    target = "feedsync.assign",
                    variant_id = variant_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "attach_transient_failure_retrying"
                );
                sleep(delay).await;
            }
            _ => break,
        }
    }

    AttachOutcome::Failed {
        method: ALL_METHODS_FAILED,
        error: last_error
            .unwrap_or_else(|| ClientError::Request("no attach method attempted".into())),
    }
}

/// Attach an existing media object to a sibling product of a split family,
/// with the same classification and bounded retry rules.
pub async fn attach_media_to_product<C: CatalogApi>(
    client: &C,
    policy: &RetryPolicy,
    product_id: &str,
    media_id: &str,
) -> Result<(), ClientError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = ClientError::Request("no attach attempted".into());

    for attempt in 1..=max_attempts {
        match client.attach_media_to_product(product_id, media_id).await {
            Ok(_) => return Ok(()),
            Err(err) if err.is_conflict() => return Ok(()),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = if matches!(err, ClientError::RateLimited) {
                    policy.rate_limit_cooldown
                } else {
                    policy.backoff_unit * attempt
                };
                warn!(
                    target = "feedsync.assign",
                    product_id = product_id,
                    attempt = attempt,
                    error = %err,
                    "product_media_attach_retrying"
                );
                last_error = err;
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_error)
}
