//! Supplier record to product draft mapping.

use crate::assign::naming::{descriptive_filename, is_main_image_caption, title_case};
use crate::feed::models::{SourceProduct, SourceVariant};
use crate::shopify::types::{NewImage, ProductDraft, ProductOption, VariantDraft};

/// Lowercase, alphanumeric-and-hyphen slug. Runs of other characters collapse
/// into a single hyphen.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.extend(ch.to_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Handle for a product: title plus supplier code, so two suppliers sharing a
/// title never collide.
pub fn product_handle(source: &SourceProduct) -> String {
    slugify(&format!("{} {}", source.title, source.code))
}

fn unique_in_order(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !value.is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

fn body_html(source: &SourceProduct) -> String {
    let description = source.description.trim();
    let size_table = source.size_table.trim();
    if size_table.is_empty() {
        description.to_string()
    } else {
        format!("{description}\n<br/>\n{size_table}")
    }
}

/// Map one supplier image to an upload payload. The main shot (caption
/// "product image") gets the product title as alt text; color shots keep the
/// caption. Filenames follow the descriptive convention the matcher expects.
fn build_image(source: &SourceProduct, index: usize, url: &str, caption: &str) -> NewImage {
    let (alt, color) = if is_main_image_caption(caption) {
        (title_case(&source.title), None)
    } else {
        (caption.trim().to_string(), Some(caption.trim()))
    };
    NewImage {
        src: url.to_string(),
        alt,
        filename: descriptive_filename(&source.title, color),
        position: Some(index as u32 + 1),
    }
}

/// Build the creation draft for one product from a subset of its variants.
/// Splitting passes per-size subsets; the unsplit path passes them all.
pub fn build_draft(source: &SourceProduct, variants: &[SourceVariant]) -> ProductDraft {
    let colors = unique_in_order(variants.iter().map(|v| v.color.trim().to_string()));
    let sizes = unique_in_order(variants.iter().map(|v| v.size.trim().to_string()));

    let mut options = Vec::new();
    if !colors.is_empty() {
        options.push(ProductOption {
            name: "Color".to_string(),
            values: colors,
        });
    }
    if !sizes.is_empty() {
        options.push(ProductOption {
            name: "Size".to_string(),
            values: sizes,
        });
    }

    ProductDraft {
        title: source.title.clone(),
        handle: product_handle(source),
        vendor: source.brand.clone(),
        body_html: body_html(source),
        product_type: source
            .categories
            .last()
            .map(|c| c.name.clone())
            .unwrap_or_default(),
        tags: source.categories.iter().map(|c| c.name.clone()).collect(),
        status: "active".to_string(),
        options,
        variants: variants
            .iter()
            .map(|v| VariantDraft {
                sku: v.code.clone(),
                color: v.color.trim().to_string(),
                size: v.size.trim().to_string(),
                price: v.price.clone(),
                compare_at_price: v.compare_at_price.clone(),
                inventory_quantity: v.stock,
            })
            .collect(),
        images: source
            .images
            .iter()
            .enumerate()
            .map(|(index, img)| build_image(source, index, &img.url, &img.caption))
            .collect(),
        metafields: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::models::{SourceCategory, SourceImage};

    fn variant(code: &str, color: &str, size: &str) -> SourceVariant {
        SourceVariant {
            code: code.to_string(),
            color: color.to_string(),
            size: size.to_string(),
            price: "49.90".to_string(),
            compare_at_price: None,
            stock: 3,
        }
    }

    fn sample() -> SourceProduct {
        SourceProduct {
            code: "TX100".to_string(),
            title: "Trail Jacket".to_string(),
            description: "Weatherproof shell.".to_string(),
            brand: "Nordwand".to_string(),
            size_table: "S 46cm / M 50cm".to_string(),
            categories: vec![
                SourceCategory {
                    id: "1".to_string(),
                    name: "Outdoor".to_string(),
                },
                SourceCategory {
                    id: "7".to_string(),
                    name: "Jackets".to_string(),
                },
            ],
            variants: vec![
                variant("TX100-R-S", "Red", "S"),
                variant("TX100-R-M", "Red", "M"),
                variant("TX100-B-S", "Blue", "S"),
            ],
            images: vec![
                SourceImage {
                    url: "https://cdn.supplier/tx100-main.jpg".to_string(),
                    caption: "Product Image".to_string(),
                },
                SourceImage {
                    url: "https://cdn.supplier/tx100-red.jpg".to_string(),
                    caption: "Red".to_string(),
                },
            ],
        }
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Trail Jacket  (2024)"), "trail-jacket-2024");
        assert_eq!(slugify("--Éclair--"), "éclair");
    }

    #[test]
    fn handle_includes_supplier_code() {
        assert_eq!(product_handle(&sample()), "trail-jacket-tx100");
    }

    #[test]
    fn options_are_unique_in_first_seen_order() {
        let draft = build_draft(&sample(), &sample().variants);
        assert_eq!(draft.options.len(), 2);
        assert_eq!(draft.options[0].name, "Color");
        assert_eq!(draft.options[0].values, vec!["Red", "Blue"]);
        assert_eq!(draft.options[1].name, "Size");
        assert_eq!(draft.options[1].values, vec!["S", "M"]);
    }

    #[test]
    fn main_image_gets_title_alt_and_plain_filename() {
        let draft = build_draft(&sample(), &sample().variants);
        assert_eq!(draft.images[0].alt, "Trail Jacket");
        assert_eq!(draft.images[0].filename, "Trail Jacket.jpg");
        assert_eq!(draft.images[1].alt, "Red");
        assert_eq!(draft.images[1].filename, "Trail Jacket + Red.jpg");
        assert_eq!(draft.images[1].position, Some(2));
    }

    #[test]
    fn body_concatenates_description_and_size_table() {
        let draft = build_draft(&sample(), &sample().variants);
        assert!(draft.body_html.starts_with("Weatherproof shell."));
        assert!(draft.body_html.ends_with("S 46cm / M 50cm"));
    }

    #[test]
    fn categories_become_tags_and_type() {
        let draft = build_draft(&sample(), &sample().variants);
        assert_eq!(draft.tags, vec!["Outdoor", "Jackets"]);
        assert_eq!(draft.product_type, "Jackets");
    }
}
