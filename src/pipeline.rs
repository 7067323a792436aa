//! Import driver: feed records in, catalog products out.
//!
//! Entities are isolated from each other: one product failing is counted and
//! logged, never allowed to abort its siblings. The run ends with a summary
//! of counters instead of a single pass/fail verdict.

use crate::assign::cache::{CacheOutcome, ImageUploadCache, UploadedImage};
use crate::assign::matcher::{
    ColorImageCache, ImageMatch, MatchStrategy, derive_color_key, resolve_image_for_variant,
};
use crate::assign::retry::{
    AttachOutcome, RetryPolicy, attach_image_to_variant, attach_media_to_product,
};
use crate::config;
use crate::feed::models::SourceProduct;
use crate::grouping::{ensure_grouping_record, finalize_grouping_record};
use crate::shopify::client::CatalogApi;
use crate::shopify::types::{CreatedProduct, Metafield, ProductDraft, ProductImage};
use crate::split::split_product;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
#[error("{stage}: {message}")]
pub struct ImportError {
    pub stage: &'static str,
    pub message: String,
}

impl ImportError {
    fn new(stage: &'static str, message: impl ToString) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub retry: RetryPolicy,
    /// Delay inserted between write calls to stay under the API rate limit.
    pub pacing: Duration,
}

impl ImportOptions {
    pub fn from_env() -> Self {
        Self {
            retry: RetryPolicy::from_env(),
            pacing: config::pacing(),
        }
    }

    #[cfg(test)]
    pub fn unpaced() -> Self {
        Self {
            retry: RetryPolicy::immediate(),
            pacing: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub products_created: usize,
    pub products_existing: usize,
    pub groupings_finalized: usize,
    pub images_uploaded: usize,
    pub images_reused: usize,
    pub variants_assigned: usize,
    pub variants_unassigned: usize,
    pub fallback_assignments: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            target = "feedsync.pipeline",
            products_created = self.products_created,
            products_existing = self.products_existing,
            groupings_finalized = self.groupings_finalized,
            images_uploaded = self.images_uploaded,
            images_reused = self.images_reused,
            variants_assigned = self.variants_assigned,
            variants_unassigned = self.variants_unassigned,
            fallback_assignments = self.fallback_assignments,
            errors = self.errors,
            "import_run_finished"
        );
    }
}

pub struct Importer<C: CatalogApi> {
    client: C,
    options: ImportOptions,
    /// Shared across the whole run so later products reuse earlier uploads.
    images: ImageUploadCache,
}

impl<C: CatalogApi> Importer<C> {
    pub fn new(client: C, options: ImportOptions) -> Self {
        Self {
            client,
            options,
            images: ImageUploadCache::new(),
        }
    }

    pub async fn run(&mut self, products: &[SourceProduct]) -> RunSummary {
        let mut summary = RunSummary::default();
        for product in products {
            if let Err(err) = self.import_product(product, &mut summary).await {
                summary.errors += 1;
                error!(
                    target = "feedsync.pipeline",
                    product = %product.code,
                    title = %product.title,
                    stage = err.stage,
                    error = %err.message,
                    "product_import_failed"
                );
            }
        }
        summary
    }

    async fn pace(&self) {
        if !self.options.pacing.is_zero() {
            sleep(self.options.pacing).await;
        }
    }

    async fn import_product(
        &mut self,
        source: &SourceProduct,
        summary: &mut RunSummary,
    ) -> Result<(), ImportError> {
        let drafts = split_product(source);

        // The grouping record must exist before the first member product so
        // each member can embed its reference at creation time.
        let grouping = if drafts.len() >= 2 {
            let record = ensure_grouping_record(&self.client, &source.title)
                .await
                .map_err(|err| ImportError::new("grouping", err))?;
            self.pace().await;
            Some(record)
        } else {
            None
        };

        let mut family_colors = ColorImageCache::default();
        let mut uploaded_by_id: HashMap<String, UploadedImage> = HashMap::new();
        let mut member_ids = Vec::with_capacity(drafts.len());

        for mut draft in drafts {
            if let Some(record) = &grouping {
                draft.metafields.push(Metafield::new(
                    "product_grouping",
                    "grouping",
                    record.id.clone(),
                    "metaobject_reference",
                ));
            }

            if let Some(existing) = self
                .client
                .find_product_by_handle(&draft.handle)
                .await
                .map_err(|err| ImportError::new("lookup", err))?
            {
                info!(
                    target = "feedsync.pipeline",
                    handle = %draft.handle,
                    id = %existing.id,
                    "product_exists_skipping_create"
                );
                summary.products_existing += 1;
                // an existing member may predate the grouping record
                if let Some(record) = &grouping {
                    let reference = Metafield::new(
                        "product_grouping",
                        "grouping",
                        record.id.clone(),
                        "metaobject_reference",
                    );
                    self.client
                        .set_metafield(&existing.id, &reference)
                        .await
                        .map_err(|err| ImportError::new("grouping_metafield", err))?;
                }
                // its images inform matching for siblings created this run
                let known_images = self
                    .client
                    .get_product_images(&existing.id)
                    .await
                    .map_err(|err| ImportError::new("image_list", err))?;
                for image in known_images {
                    if !image.alt.trim().is_empty() {
                        family_colors.insert(derive_color_key(&image.alt), &image.id);
                    }
                }
                member_ids.push(existing.id);
                self.pace().await;
                continue;
            }

            // Images go through the upload cache, not the create payload.
            let images = std::mem::take(&mut draft.images);
            let created = self
                .client
                .create_product(&draft)
                .await
                .map_err(|err| ImportError::new("create", err))?;
            summary.products_created += 1;
            self.pace().await;

            let mut product_images = Vec::with_capacity(images.len());
            for image in &images {
                let color_key = derive_color_key(&image.alt);
                let (entry, outcome) = self
                    .images
                    .get_or_upload(&self.client, &created.id, image, &color_key)
                    .await
                    .map_err(|err| ImportError::new("image_upload", err))?;
                match outcome {
                    CacheOutcome::Uploaded => summary.images_uploaded += 1,
                    CacheOutcome::LocalHit | CacheOutcome::RemoteHit => {
                        summary.images_reused += 1;
                        // share the existing media object with this product so
                        // variant attaches can reference it
                        if let Some(media_id) = &entry.media_id
                            && let Err(err) = attach_media_to_product(
                                &self.client,
                                &self.options.retry,
                                &created.id,
                                media_id,
                            )
                            .await
                        {
                            warn!(
                                target = "feedsync.pipeline",
                                product_id = %created.id,
                                media_id = %media_id,
                                error = %err,
                                "media_share_failed"
                            );
                        }
                    }
                }
                family_colors.insert(&color_key, &entry.image_id);
                product_images.push(ProductImage {
                    id: entry.image_id.clone(),
                    src: entry.src.clone(),
                    alt: entry.alt.clone(),
                    position: image.position.unwrap_or(0),
                });
                uploaded_by_id.insert(entry.image_id.clone(), entry);
                self.pace().await;
            }

            self.assign_variant_images(
                &created,
                &draft,
                &source.title,
                &product_images,
                &mut family_colors,
                &uploaded_by_id,
                summary,
            )
            .await;

            member_ids.push(created.id);
        }

        if let Some(record) = &grouping {
            finalize_grouping_record(&self.client, &record.id, &member_ids)
                .await
                .map_err(|err| ImportError::new("grouping_finalize", err))?;
            summary.groupings_finalized += 1;
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn assign_variant_images(
        &self,
        created: &CreatedProduct,
        draft: &ProductDraft,
        product_title: &str,
        product_images: &[ProductImage],
        family_colors: &mut ColorImageCache,
        uploaded_by_id: &HashMap<String, UploadedImage>,
        summary: &mut RunSummary,
    ) {
        for variant in &created.variants {
            let display_title = if variant.title.trim().is_empty() {
                draft
                    .variants
                    .iter()
                    .find(|v| v.sku == variant.sku)
                    .map(|v| format!("{} / {}", v.color, v.size))
                    .unwrap_or_default()
            } else {
                variant.title.clone()
            };

            match resolve_image_for_variant(
                &display_title,
                product_title,
                product_images,
                family_colors,
            ) {
                ImageMatch::Matched { image_id, strategy } => {
                    let image = uploaded_by_id
                        .get(&image_id)
                        .cloned()
                        .unwrap_or(UploadedImage {
                            image_id: image_id.clone(),
                            media_id: None,
                            src: String::new(),
                            alt: String::new(),
                        });
                    let outcome = attach_image_to_variant(
                        &self.client,
                        &self.options.retry,
                        &created.id,
                        &variant.id,
                        &image,
                    )
                    .await;
                    match outcome {
                        AttachOutcome::Attached { .. } | AttachOutcome::AlreadyAttached => {
                            summary.variants_assigned += 1;
                            if strategy == MatchStrategy::FirstImageFallback {
                                summary.fallback_assignments += 1;
                            }
                        }
                        AttachOutcome::Failed { method, error } => {
                            summary.errors += 1;
                            warn!(
                                target = "feedsync.pipeline",
                                variant = %variant.sku,
                                method = method,
                                error = %error,
                                "variant_image_attach_failed"
                            );
                        }
                    }
                    self.pace().await;
                }
                ImageMatch::Unassigned => {
                    summary.variants_unassigned += 1;
                }
            }
        }
    }
}
