//! Splitting of oversized products into per-size siblings.
//!
//! The platform caps a product at [`MAX_VARIANTS`] variants. Products over
//! the cap are partitioned by size, one product per size value, each carrying
//! only its own size's variants plus metafields that tie it back to the
//! original title.

use crate::feed::models::{SourceProduct, SourceVariant};
use crate::shopify::types::{Metafield, ProductDraft};
use crate::transform::{build_draft, slugify};
use std::collections::HashMap;
use tracing::warn;

/// Platform hard limit on variants per product.
pub const MAX_VARIANTS: usize = 100;

/// Canonical apparel size order. Sizes not listed sort after all known ones,
/// alphabetically.
const SIZE_ORDER: [&str; 11] = [
    "XXS", "XS", "S", "M", "L", "XL", "XXL", "3XL", "4XL", "5XL", "6XL",
];

fn size_rank(size: &str) -> Option<usize> {
    SIZE_ORDER
        .iter()
        .position(|known| known.eq_ignore_ascii_case(size))
}

/// Lowercased size token for handles, non-alphanumerics collapsed to hyphens.
pub fn normalize_size(size: &str) -> String {
    slugify(size)
}

/// Partition a product into creation drafts.
///
/// At or under the cap, the result is one draft with all variants. Over the
/// cap, one draft per distinct size, ordered by the canonical size table.
/// Variants with a blank size are dropped with a warning; if every variant is
/// blank-sized the product falls back to a single draft.
pub fn split_product(source: &SourceProduct) -> Vec<ProductDraft> {
    if source.variants.len() <= MAX_VARIANTS {
        return vec![build_draft(source, &source.variants)];
    }

    let mut sizes_in_order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<SourceVariant>> = HashMap::new();
    for variant in &source.variants {
        let size = variant.size.trim().to_string();
        if size.is_empty() {
            warn!(
                target = "feedsync.split",
                product = %source.code,
                sku = %variant.code,
                "variant_has_blank_size_dropped_from_split"
            );
            continue;
        }
        if !buckets.contains_key(&size) {
            sizes_in_order.push(size.clone());
        }
        buckets.entry(size).or_default().push(variant.clone());
    }

    if buckets.is_empty() {
        warn!(
            target = "feedsync.split",
            product = %source.code,
            "no_sized_variants_falling_back_to_single_product"
        );
        return vec![build_draft(source, &source.variants)];
    }

    sizes_in_order.sort_by(|a, b| match (size_rank(a), size_rank(b)) {
        (Some(ra), Some(rb)) => ra.cmp(&rb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    });

    sizes_in_order
        .iter()
        .filter_map(|size| {
            let variants = buckets.remove(size)?;
            if variants.is_empty() {
                return None;
            }
            let mut draft = build_draft(source, &variants);
            draft.title = format!("{} - {}", source.title, size);
            draft.handle = format!("{}-size-{}", draft.handle, normalize_size(size));
            draft.metafields.push(Metafield::new(
                "product_grouping",
                "option_1",
                source.title.clone(),
                "single_line_text_field",
            ));
            draft.metafields.push(Metafield::new(
                "product_grouping",
                "option_1_value",
                size.clone(),
                "single_line_text_field",
            ));
            Some(draft)
        })
        .collect()
}
