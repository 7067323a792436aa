use super::client::ShopifyClient;
use super::error::{ClientError, classify_user_error};
use super::types::{
    AttachEcho, CreatedProduct, CreatedVariant, Metafield, NewImage, ProductDraft, ProductImage,
};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use urlencoding::encode;

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited);
    }
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
        return Err(classify_user_error(&body));
    }
    Err(ClientError::Request(format!("HTTP {status}: {body}")))
}

#[derive(Debug, Deserialize)]
struct RestVariant {
    id: u64,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct RestProduct {
    id: u64,
    handle: String,
    title: String,
    #[serde(default)]
    variants: Vec<RestVariant>,
}

impl From<RestProduct> for CreatedProduct {
    fn from(product: RestProduct) -> Self {
        CreatedProduct {
            id: product.id.to_string(),
            handle: product.handle,
            title: product.title,
            variants: product
                .variants
                .into_iter()
                .map(|v| CreatedVariant {
                    id: v.id.to_string(),
                    sku: v.sku.unwrap_or_default(),
                    title: v.title,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RestImage {
    id: u64,
    #[serde(default)]
    src: String,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    position: u32,
}

impl From<RestImage> for ProductImage {
    fn from(image: RestImage) -> Self {
        ProductImage {
            id: image.id.to_string(),
            src: image.src,
            alt: image.alt.unwrap_or_default(),
            position: image.position,
        }
    }
}

pub(super) async fn find_product_by_handle(
    client: &ShopifyClient,
    handle: &str,
) -> Result<Option<CreatedProduct>, ClientError> {
    #[derive(Deserialize)]
    struct ProductList {
        products: Vec<RestProduct>,
    }
    let response = client
        .http
        .get(client.rest_url("products.json"))
        .header("X-Shopify-Access-Token", client.token.as_str())
        .query(&[("handle", handle)])
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    let payload: ProductList = check(response)
        .await?
        .json()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    Ok(payload.products.into_iter().next().map(Into::into))
}

pub(super) async fn create_product(
    client: &ShopifyClient,
    draft: &ProductDraft,
) -> Result<CreatedProduct, ClientError> {
    let variants: Vec<Value> = draft
        .variants
        .iter()
        .map(|v| {
            json!({
                "sku": v.sku,
                "option1": v.color,
                "option2": v.size,
                "price": v.price,
                "compare_at_price": v.compare_at_price,
                "inventory_quantity": v.inventory_quantity,
            })
        })
        .collect();
    let options: Vec<Value> = draft
        .options
        .iter()
        .map(|o| json!({ "name": o.name, "values": o.values }))
        .collect();
    let payload = json!({
        "product": {
            "title": draft.title,
            "handle": draft.handle,
            "vendor": draft.vendor,
            "body_html": draft.body_html,
            "product_type": draft.product_type,
            "tags": draft.tags.join(", "),
            "status": draft.status,
            "options": options,
            "variants": variants,
            "metafields": draft.metafields,
        }
    });

    #[derive(Deserialize)]
    struct ProductEnvelope {
        product: RestProduct,
    }
    let response = client
        .http
        .post(client.rest_url("products.json"))
        .header("X-Shopify-Access-Token", client.token.as_str())
        .json(&payload)
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    let envelope: ProductEnvelope = check(response)
        .await?
        .json()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    Ok(envelope.product.into())
}

pub(super) async fn get_product_images(
    client: &ShopifyClient,
    product_id: &str,
) -> Result<Vec<ProductImage>, ClientError> {
    #[derive(Deserialize)]
    struct ImageList {
        images: Vec<RestImage>,
    }
    let path = format!("products/{}/images.json", encode(product_id));
    let response = client
        .http
        .get(client.rest_url(&path))
        .header("X-Shopify-Access-Token", client.token.as_str())
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    let payload: ImageList = check(response)
        .await?
        .json()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    Ok(payload.images.into_iter().map(Into::into).collect())
}

pub(super) async fn create_image(
    client: &ShopifyClient,
    product_id: &str,
    image: &NewImage,
) -> Result<ProductImage, ClientError> {
    #[derive(Deserialize)]
    struct ImageEnvelope {
        image: RestImage,
    }
    let path = format!("products/{}/images.json", encode(product_id));
    let payload = json!({
        "image": {
            "src": image.src,
            "alt": image.alt,
            "filename": image.filename,
            "position": image.position,
        }
    });
    let response = client
        .http
        .post(client.rest_url(&path))
        .header("X-Shopify-Access-Token", client.token.as_str())
        .json(&payload)
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    let envelope: ImageEnvelope = check(response)
        .await?
        .json()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    Ok(envelope.image.into())
}

pub(super) async fn set_metafield(
    client: &ShopifyClient,
    product_id: &str,
    metafield: &Metafield,
) -> Result<(), ClientError> {
    let path = format!("products/{}/metafields.json", encode(product_id));
    let response = client
        .http
        .post(client.rest_url(&path))
        .header("X-Shopify-Access-Token", client.token.as_str())
        .json(&json!({ "metafield": metafield }))
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    check(response).await?;
    Ok(())
}

/// Single-update attach shape: set `image_id` directly on the variant.
pub(super) async fn update_variant_image(
    client: &ShopifyClient,
    variant_id: &str,
    image_id: &str,
) -> Result<AttachEcho, ClientError> {
    #[derive(Deserialize)]
    struct VariantEnvelope {
        variant: VariantEcho,
    }
    #[derive(Deserialize)]
    struct VariantEcho {
        #[serde(default)]
        image_id: Option<u64>,
    }
    let path = format!("variants/{}.json", encode(variant_id));
    let payload = json!({ "variant": { "id": variant_id, "image_id": image_id } });
    let response = client
        .http
        .put(client.rest_url(&path))
        .header("X-Shopify-Access-Token", client.token.as_str())
        .json(&payload)
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    let envelope: VariantEnvelope = check(response)
        .await?
        .json()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    Ok(AttachEcho {
        media_id: None,
        image_id: envelope.variant.image_id.map(|id| id.to_string()),
    })
}
