use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Draft of a platform product, ready to be created remotely.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct ProductDraft {
    pub title: String,
    pub handle: String,
    pub vendor: String,
    pub body_html: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub status: String,
    pub options: Vec<ProductOption>,
    pub variants: Vec<VariantDraft>,
    pub images: Vec<NewImage>,
    pub metafields: Vec<Metafield>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct VariantDraft {
    pub sku: String,
    pub color: String,
    pub size: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub inventory_quantity: i64,
}

/// A product image to upload: source URL plus the alt text and descriptive
/// filename derived from the supplier caption.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct NewImage {
    pub src: String,
    pub alt: String,
    pub filename: String,
    pub position: Option<u32>,
}

/// Media-object creation payload (the platform's second identifier space for
/// the same asset).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    pub original_source: String,
    pub alt: String,
    pub media_content_type: &'static str,
}

/// An image already attached to a remote product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductImage {
    pub id: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub position: u32,
}

#[derive(Debug, Clone)]
pub struct MediaRef {
    pub id: String,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

impl Metafield {
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
            value_type: value_type.into(),
        }
    }
}

/// Reference to a metaobject (grouping record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaobjectRef {
    pub id: String,
    pub display_name: String,
}

/// Echo returned by a variant/product attach call. A populated reference in
/// the echoed result is what distinguishes a real attach from a silent no-op.
#[derive(Debug, Clone, Default)]
pub struct AttachEcho {
    pub media_id: Option<String>,
    pub image_id: Option<String>,
}

impl AttachEcho {
    pub fn is_populated(&self) -> bool {
        self.media_id.is_some() || self.image_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CreatedProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variants: Vec<CreatedVariant>,
}

#[derive(Debug, Clone)]
pub struct CreatedVariant {
    pub id: String,
    pub sku: String,
    pub title: String,
}
