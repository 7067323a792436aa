//! Content-addressable upload cache.
//!
//! One cache instance is shared across a whole import run, so images reused
//! by sibling products of a split family (or by later products referencing
//! the same supplier asset) are uploaded exactly once. Lookup order: local
//! cache by source URL, then a remote-wide search, then a genuine upload.
//! The remote search exists because the platform appends a uniqueness suffix
//! to filenames on physical re-upload; reusing the existing asset's
//! identifier avoids ever creating that suffixed duplicate.

use crate::shopify::client::CatalogApi;
use crate::shopify::error::ClientError;
use crate::shopify::types::{NewImage, NewMedia};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A resolved remote image, carrying both identifier spaces: the product
/// image id and, when available, the media-object id some attach shapes need.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub image_id: String,
    pub media_id: Option<String>,
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from the in-process cache; no network call.
    LocalHit,
    /// An asset with this source URL already existed remotely.
    RemoteHit,
    /// A new upload was performed.
    Uploaded,
}

#[derive(Debug, Default)]
pub struct ImageUploadCache {
    by_source_url: HashMap<String, UploadedImage>,
    by_color_key: HashMap<String, UploadedImage>,
}

impl ImageUploadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_url(&self, url: &str) -> Option<&UploadedImage> {
        self.by_source_url.get(url)
    }

    pub fn lookup_color(&self, color_key: &str) -> Option<&UploadedImage> {
        self.by_color_key.get(color_key)
    }

    pub async fn get_or_upload<C: CatalogApi>(
        &mut self,
        client: &C,
        product_id: &str,
        image: &NewImage,
        color_key: &str,
    ) -> Result<(UploadedImage, CacheOutcome), ClientError> {
        if let Some(hit) = self.by_source_url.get(&image.src) {
            return Ok((hit.clone(), CacheOutcome::LocalHit));
        }

        if let Some(existing) = client.find_image_by_source(&image.src).await? {
            debug!(
                target = "feedsync.assign",
                src = %image.src,
                image_id = %existing.id,
                "reusing_remote_image_for_source_url"
            );
            let entry = UploadedImage {
                image_id: existing.id,
                media_id: None,
                src: image.src.clone(),
                alt: if existing.alt.trim().is_empty() {
                    image.alt.clone()
                } else {
                    existing.alt
                },
            };
            self.store(color_key, entry.clone());
            return Ok((entry, CacheOutcome::RemoteHit));
        }

        let created = client.create_image(product_id, image).await?;
        let media = NewMedia {
            original_source: image.src.clone(),
            alt: image.alt.clone(),
            media_content_type: "IMAGE",
        };
        let media_id = match client.create_media(product_id, &media).await {
            Ok(media) => Some(media.id),
            Err(err) => {
                warn!(
                    target = "feedsync.assign",
                    src = %image.src,
                    error = %err,
                    "media_create_failed_keeping_image_only"
                );
                None
            }
        };
        let entry = UploadedImage {
            image_id: created.id,
            media_id,
            src: image.src.clone(),
            alt: created.alt,
        };
        self.store(color_key, entry.clone());
        Ok((entry, CacheOutcome::Uploaded))
    }

    fn store(&mut self, color_key: &str, entry: UploadedImage) {
        self.by_color_key.insert(color_key.to_string(), entry.clone());
        self.by_source_url.insert(entry.src.clone(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::testing::FakeCatalog;

    fn new_image(src: &str, alt: &str) -> NewImage {
        NewImage {
            src: src.to_string(),
            alt: alt.to_string(),
            filename: format!("{alt}.jpg"),
            position: Some(1),
        }
    }

    #[tokio::test]
    async fn second_call_with_same_url_never_uploads_again() {
        let fake = FakeCatalog::new();
        let mut cache = ImageUploadCache::new();
        let image = new_image("https://cdn/x.jpg", "Red");

        let (first, outcome) = cache
            .get_or_upload(&fake, "p1", &image, "red")
            .await
            .expect("first upload");
        assert_eq!(outcome, CacheOutcome::Uploaded);
        assert_eq!(fake.create_image_calls(), 1);

        let (second, outcome) = cache
            .get_or_upload(&fake, "p2", &image, "red")
            .await
            .expect("cached lookup");
        assert_eq!(outcome, CacheOutcome::LocalHit);
        assert_eq!(second.image_id, first.image_id);
        assert_eq!(fake.create_image_calls(), 1);
    }

    #[tokio::test]
    async fn remote_search_reuses_previously_imported_asset() {
        let fake = FakeCatalog::new();
        // an earlier run left this image on some other product
        use crate::shopify::client::CatalogApi;
        let seeded = fake
            .create_image("old-product", &new_image("https://cdn/x.jpg", "Red"))
            .await
            .expect("seed");

        let mut cache = ImageUploadCache::new();
        let (entry, outcome) = cache
            .get_or_upload(&fake, "p1", &new_image("https://cdn/x.jpg", "Red"), "red")
            .await
            .expect("remote hit");
        assert_eq!(outcome, CacheOutcome::RemoteHit);
        assert_eq!(entry.image_id, seeded.id);
        // only the seeding call hit create_image
        assert_eq!(fake.create_image_calls(), 1);
        assert_eq!(fake.create_media_calls(), 0);
    }

    #[tokio::test]
    async fn upload_caches_under_url_and_color_key_with_media_id() {
        let fake = FakeCatalog::new();
        let mut cache = ImageUploadCache::new();
        let (entry, _) = cache
            .get_or_upload(&fake, "p1", &new_image("https://cdn/x.jpg", "Red"), "red")
            .await
            .expect("upload");
        assert!(entry.media_id.is_some());
        assert_eq!(fake.create_media_calls(), 1);
        assert_eq!(
            cache.lookup_url("https://cdn/x.jpg").map(|e| e.image_id.as_str()),
            Some(entry.image_id.as_str())
        );
        assert_eq!(
            cache.lookup_color("red").map(|e| e.image_id.as_str()),
            Some(entry.image_id.as_str())
        );
    }
}
