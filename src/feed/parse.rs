use super::models::{SourceCategory, SourceImage, SourceProduct, SourceVariant};
use crate::http::build_client;
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed fetch failed: {0}")]
    Fetch(String),
    #[error("malformed feed: {0}")]
    Malformed(String),
}

/// Download and parse one supplier feed. A malformed document is a fatal
/// error; per-product problems are not detectable at this layer.
pub async fn fetch_feed(url: &str) -> Result<Vec<SourceProduct>, FeedError> {
    let client = build_client();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| FeedError::Fetch(err.to_string()))?;
    if !response.status().is_success() {
        return Err(FeedError::Fetch(format!("HTTP {}", response.status())));
    }
    let body = response
        .text()
        .await
        .map_err(|err| FeedError::Fetch(err.to_string()))?;
    let products = parse_feed(&body)?;
    info!(
        target = "feedsync.feed",
        url = url,
        products = products.len(),
        "feed_parsed"
    );
    Ok(products)
}

/// Parse the supplier XML into normalized [`SourceProduct`]s.
///
/// Repeated `<variant>`, `<image>` and `<category>` siblings accumulate into
/// vectors, so a product with a single image yields a one-element list rather
/// than a bare object.
pub fn parse_feed(xml: &str) -> Result<Vec<SourceProduct>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut products = Vec::new();
    let mut saw_root = false;
    let mut product: Option<SourceProduct> = None;
    let mut variant: Option<SourceVariant> = None;
    let mut image: Option<SourceImage> = None;
    let mut category: Option<SourceCategory> = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "products" => saw_root = true,
                    "product" => product = Some(SourceProduct::default()),
                    "variant" => variant = Some(SourceVariant::default()),
                    "image" => image = Some(SourceImage::default()),
                    "category" => {
                        let mut entry = SourceCategory::default();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"id" {
                                entry.id = attr
                                    .unescape_value()
                                    .unwrap_or_default()
                                    .into_owned();
                            }
                        }
                        category = Some(entry);
                    }
                    _ => {}
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "product" => {
                        if let Some(done) = product.take() {
                            products.push(done);
                        }
                    }
                    "variant" => {
                        if let (Some(parent), Some(done)) = (product.as_mut(), variant.take()) {
                            parent.variants.push(done);
                        }
                    }
                    "image" => {
                        if let (Some(parent), Some(done)) = (product.as_mut(), image.take()) {
                            parent.images.push(done);
                        }
                    }
                    "category" => {
                        if let (Some(parent), Some(done)) = (product.as_mut(), category.take()) {
                            parent.categories.push(done);
                        }
                    }
                    _ => {}
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                assign_text(
                    &current_tag,
                    text,
                    &mut product,
                    &mut variant,
                    &mut image,
                    &mut category,
                );
            }
            Ok(Event::Eof) => {
                if product.is_some() {
                    return Err(FeedError::Malformed(
                        "document ended inside a <product> element".into(),
                    ));
                }
                break;
            }
            Err(err) => return Err(FeedError::Malformed(err.to_string())),
            _ => {}
        }
    }

    if !saw_root {
        return Err(FeedError::Malformed(
            "missing <products> root element".into(),
        ));
    }
    Ok(products)
}

fn assign_text(
    tag: &str,
    text: String,
    product: &mut Option<SourceProduct>,
    variant: &mut Option<SourceVariant>,
    image: &mut Option<SourceImage>,
    category: &mut Option<SourceCategory>,
) {
    if let Some(image) = image.as_mut() {
        match tag {
            "url" => image.url = text,
            "caption" => image.caption = text,
            _ => {}
        }
        return;
    }
    if let Some(variant) = variant.as_mut() {
        match tag {
            "code" => variant.code = text,
            "color" => variant.color = text,
            "size" => variant.size = text,
            "price" => variant.price = text,
            "compare_at_price" => variant.compare_at_price = Some(text),
            "stock" => variant.stock = text.trim().parse().unwrap_or(0),
            _ => {}
        }
        return;
    }
    if let Some(category) = category.as_mut() {
        if tag == "category" {
            category.name = text;
        }
        return;
    }
    if let Some(product) = product.as_mut() {
        match tag {
            "code" => product.code = text,
            "title" => product.title = text,
            "description" => product.description = text,
            "brand" => product.brand = text,
            "sizetable" => product.size_table = text,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <products>
          <product>
            <code>TX100</code>
            <title>Trail Jacket</title>
            <description>Waterproof shell.</description>
            <brand>Korpi</brand>
            <sizetable>S 46 | M 48 | L 50</sizetable>
            <categories>
              <category id="12">Outdoor</category>
              <category id="31">Jackets</category>
            </categories>
            <variants>
              <variant>
                <code>TX100-RED-M</code>
                <color>Red</color>
                <size>M</size>
                <price>89.90</price>
                <stock>4</stock>
              </variant>
              <variant>
                <code>TX100-BLU-L</code>
                <color>Blue</color>
                <size>L</size>
                <price>89.90</price>
                <compare_at_price>109.90</compare_at_price>
                <stock>2</stock>
              </variant>
            </variants>
            <images>
              <image>
                <url>https://cdn.example.com/tx100-red.jpg</url>
                <caption>Red</caption>
              </image>
            </images>
          </product>
        </products>
    "#;

    #[test]
    fn parses_products_variants_and_images() {
        let products = parse_feed(FIXTURE).expect("parse");
        assert_eq!(products.len(), 1);
        let product = &products[0];
        assert_eq!(product.code, "TX100");
        assert_eq!(product.title, "Trail Jacket");
        assert_eq!(product.brand, "Korpi");
        assert_eq!(product.categories.len(), 2);
        assert_eq!(product.categories[0].id, "12");
        assert_eq!(product.categories[0].name, "Outdoor");
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.variants[0].code, "TX100-RED-M");
        assert_eq!(product.variants[0].stock, 4);
        assert_eq!(
            product.variants[1].compare_at_price.as_deref(),
            Some("109.90")
        );
        // single <image> still lands in a list
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.images[0].caption, "Red");
    }

    #[test]
    fn variant_code_does_not_clobber_product_code() {
        let products = parse_feed(FIXTURE).expect("parse");
        assert_eq!(products[0].code, "TX100");
        assert_eq!(products[0].variants[0].code, "TX100-RED-M");
    }

    #[test]
    fn missing_root_is_structural_error() {
        let err = parse_feed("<items><item/></items>").expect_err("should fail");
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn truncated_document_is_structural_error() {
        let err = parse_feed("<products><product><title>x</title>").expect_err("should fail");
        assert!(matches!(err, FeedError::Malformed(_)));
    }
}
