//! Normalized supplier feed records.
//!
//! The raw XML encodes single-child fields as a bare element and multi-child
//! fields as repeated siblings. The parser flattens both shapes into the
//! always-a-list representation below, so nothing downstream ever sees the
//! one-or-many ambiguity.

/// One product record from the supplier feed. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct SourceProduct {
    /// Supplier SKU prefix, unique per product.
    pub code: String,
    pub title: String,
    pub description: String,
    pub brand: String,
    /// Free-text size table, rendered into the product body.
    pub size_table: String,
    pub categories: Vec<SourceCategory>,
    pub variants: Vec<SourceVariant>,
    pub images: Vec<SourceImage>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceCategory {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SourceVariant {
    /// Unique within the parent product.
    pub code: String,
    pub color: String,
    pub size: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub stock: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SourceImage {
    pub url: String,
    /// Supplier caption: a color name, or the literal "product image" for the
    /// main shot.
    pub caption: String,
}
