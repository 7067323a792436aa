//! Variant-to-image resolution.
//!
//! Each variant derives a color key from its display title, then walks an
//! ordered strategy chain against the product's uploaded images. Every hit is
//! written back to the shared color cache so subsequent variants of the same
//! color (in this product or a sibling split product) skip the chain.

use super::naming::descriptive_filename;
use crate::shopify::types::ProductImage;
use std::collections::HashMap;
use tracing::warn;

/// Derive a color key from a variant display title.
///
/// Order of rules: text before the first `" - "`, else before the first `/`,
/// else the first whitespace token, else the whole title. Blank results map
/// to the literal key `"default"`.
pub fn derive_color_key(variant_title: &str) -> String {
    let title = variant_title.trim();
    let raw = if let Some((head, _)) = title.split_once(" - ") {
        head
    } else if let Some((head, _)) = title.split_once('/') {
        head
    } else if let Some((head, _)) = title.split_once(char::is_whitespace) {
        head
    } else {
        title
    };
    let key = raw.trim().to_lowercase();
    if key.is_empty() { "default".to_string() } else { key }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    ColorCache,
    ExactAlt,
    CaseInsensitiveAlt,
    SubstringAlt,
    FilenamePattern,
    FirstImageFallback,
}

#[derive(Debug, Clone)]
pub enum ImageMatch {
    Matched {
        image_id: String,
        strategy: MatchStrategy,
    },
    /// No images exist for the product; nothing to attach.
    Unassigned,
}

/// Color key to image identifier, shared across all products of a split
/// family. Constructed per family and passed explicitly.
#[derive(Debug, Default)]
pub struct ColorImageCache {
    entries: HashMap<String, String>,
}

impl ColorImageCache {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, image_id: impl Into<String>) {
        self.entries.insert(key.into(), image_id.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve an image for one variant. First strategy that produces a result
/// wins; the hit is cached under the derived color key before returning.
pub fn resolve_image_for_variant(
    variant_title: &str,
    product_title: &str,
    images: &[ProductImage],
    cache: &mut ColorImageCache,
) -> ImageMatch {
    let key = derive_color_key(variant_title);
    if let Some(hit) = cache.get(&key) {
        return ImageMatch::Matched {
            image_id: hit.to_string(),
            strategy: MatchStrategy::ColorCache,
        };
    }

    let resolved = exact_alt(images, &key)
        .map(|img| (img, MatchStrategy::ExactAlt))
        .or_else(|| {
            case_insensitive_alt(images, &key).map(|img| (img, MatchStrategy::CaseInsensitiveAlt))
        })
        .or_else(|| substring_alt(images, &key).map(|img| (img, MatchStrategy::SubstringAlt)))
        .or_else(|| {
            filename_pattern(images, product_title, &key)
                .map(|img| (img, MatchStrategy::FilenamePattern))
        })
        .or_else(|| {
            images.first().map(|img| {
                warn!(
                    target = "feedsync.assign",
                    variant_title = variant_title,
                    color_key = %key,
                    image_id = %img.id,
                    "no_image_matched_color_falling_back_to_first"
                );
                (img, MatchStrategy::FirstImageFallback)
            })
        });

    match resolved {
        Some((image, strategy)) => {
            cache.insert(&key, &image.id);
            ImageMatch::Matched {
                image_id: image.id.clone(),
                strategy,
            }
        }
        None => {
            warn!(
                target = "feedsync.assign",
                variant_title = variant_title,
                "product_has_no_images_variant_left_unassigned"
            );
            ImageMatch::Unassigned
        }
    }
}

fn exact_alt<'a>(images: &'a [ProductImage], key: &str) -> Option<&'a ProductImage> {
    images.iter().find(|img| img.alt.trim().to_lowercase() == key)
}

fn case_insensitive_alt<'a>(images: &'a [ProductImage], key: &str) -> Option<&'a ProductImage> {
    images.iter().find(|img| img.alt.to_lowercase() == key)
}

fn substring_alt<'a>(images: &'a [ProductImage], key: &str) -> Option<&'a ProductImage> {
    images.iter().find(|img| {
        let alt = img.alt.trim().to_lowercase();
        !alt.is_empty() && (alt.contains(key) || key.contains(&alt))
    })
}

fn filename_pattern<'a>(
    images: &'a [ProductImage],
    product_title: &str,
    key: &str,
) -> Option<&'a ProductImage> {
    let expected = descriptive_filename(product_title, Some(key)).to_lowercase();
    let stem = expected.trim_end_matches(".jpg");
    images.iter().find(|img| {
        let file = filename_of(&img.src).to_lowercase();
        !file.is_empty() && (file.contains(key) || file.contains(stem))
    })
}

fn filename_of(src: &str) -> &str {
    src.rsplit('/')
        .next()
        .unwrap_or(src)
        .split('?')
        .next()
        .unwrap_or_default()
}
