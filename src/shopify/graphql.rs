use super::client::ShopifyClient;
use super::error::{ClientError, classify_user_error};
use super::types::{AttachEcho, MediaRef, MetaobjectRef, NewMedia, ProductImage};
use serde_json::{Value, json};

fn gid(kind: &str, id: &str) -> String {
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/{kind}/{id}")
    }
}

pub(super) async fn execute(
    client: &ShopifyClient,
    query: &str,
    variables: Value,
) -> Result<Value, ClientError> {
    let response = client
        .http
        .post(client.graphql_url())
        .header("X-Shopify-Access-Token", client.token.as_str())
        .json(&json!({ "query": query, "variables": variables }))
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    if response.status().as_u16() == 429 {
        return Err(ClientError::RateLimited);
    }
    if !response.status().is_success() {
        return Err(ClientError::Request(format!("HTTP {}", response.status())));
    }
    let body: Value = response
        .json()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    if let Some(errors) = body.get("errors").and_then(Value::as_array)
        && let Some(first) = errors.first()
    {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("graphql error");
        return Err(ClientError::Request(message.to_string()));
    }
    Ok(body.get("data").cloned().unwrap_or(Value::Null))
}

/// Surface the first user error under `root`, classified into the typed
/// taxonomy.
fn user_errors(data: &Value, root: &str) -> Result<(), ClientError> {
    for key in ["userErrors", "mediaUserErrors"] {
        if let Some(errors) = data
            .get(root)
            .and_then(|node| node.get(key))
            .and_then(Value::as_array)
            && let Some(first) = errors.first()
        {
            let message = first
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown user error");
            return Err(classify_user_error(message));
        }
    }
    Ok(())
}

pub(super) async fn create_media(
    client: &ShopifyClient,
    product_id: &str,
    media: &NewMedia,
) -> Result<MediaRef, ClientError> {
    const QUERY: &str = r#"
        mutation createMedia($productId: ID!, $media: [CreateMediaInput!]!) {
          productCreateMedia(productId: $productId, media: $media) {
            media {
              ... on MediaImage {
                id
                image { url }
              }
            }
            mediaUserErrors { message }
          }
        }
    "#;
    let variables = json!({
        "productId": gid("Product", product_id),
        "media": [{
            "originalSource": media.original_source,
            "alt": media.alt,
            "mediaContentType": media.media_content_type,
        }],
    });
    let data = execute(client, QUERY, variables).await?;
    user_errors(&data, "productCreateMedia")?;
    let node = data
        .pointer("/productCreateMedia/media/0")
        .cloned()
        .unwrap_or(Value::Null);
    let id = node
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Request("media create returned no id".into()))?
        .to_string();
    let preview_url = node
        .pointer("/image/url")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(MediaRef { id, preview_url })
}

pub(super) async fn find_image_by_source(
    client: &ShopifyClient,
    source_url: &str,
) -> Result<Option<ProductImage>, ClientError> {
    const QUERY: &str = r#"
        query findFiles($query: String!) {
          files(first: 10, query: $query) {
            nodes {
              ... on MediaImage {
                id
                alt
                image { url }
              }
            }
          }
        }
    "#;
    let filename = source_url.rsplit('/').next().unwrap_or(source_url);
    let stem = filename.split('.').next().unwrap_or(filename);
    if stem.is_empty() {
        return Ok(None);
    }
    let data = execute(client, QUERY, json!({ "query": format!("filename:{stem}") })).await?;
    let nodes = data
        .pointer("/files/nodes")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for node in nodes {
        let url = node
            .pointer("/image/url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if url.contains(stem) {
            let id = node
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if id.is_empty() {
                continue;
            }
            return Ok(Some(ProductImage {
                id,
                src: url.to_string(),
                alt: node
                    .get("alt")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                position: 0,
            }));
        }
    }
    Ok(None)
}

/// Append-media attach shape.
pub(super) async fn append_variant_media(
    client: &ShopifyClient,
    product_id: &str,
    variant_id: &str,
    media_id: &str,
) -> Result<AttachEcho, ClientError> {
    const QUERY: &str = r#"
        mutation appendVariantMedia($productId: ID!, $variantMedia: [ProductVariantAppendMediaInput!]!) {
          productVariantAppendMedia(productId: $productId, variantMedia: $variantMedia) {
            productVariants {
              id
              media(first: 1) { nodes { id } }
            }
            userErrors { message }
          }
        }
    "#;
    let variables = json!({
        "productId": gid("Product", product_id),
        "variantMedia": [{
            "variantId": gid("ProductVariant", variant_id),
            "mediaIds": [gid("MediaImage", media_id)],
        }],
    });
    let data = execute(client, QUERY, variables).await?;
    user_errors(&data, "productVariantAppendMedia")?;
    let media_id = data
        .pointer("/productVariantAppendMedia/productVariants/0/media/nodes/0/id")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(AttachEcho {
        media_id,
        image_id: None,
    })
}

/// Bulk-update attach shape.
pub(super) async fn bulk_update_variant_image(
    client: &ShopifyClient,
    product_id: &str,
    variant_id: &str,
    image_id: &str,
) -> Result<AttachEcho, ClientError> {
    const QUERY: &str = r#"
        mutation bulkUpdateVariants($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
          productVariantsBulkUpdate(productId: $productId, variants: $variants) {
            productVariants {
              id
              media(first: 1) { nodes { id } }
            }
            userErrors { message }
          }
        }
    "#;
    let variables = json!({
        "productId": gid("Product", product_id),
        "variants": [{
            "id": gid("ProductVariant", variant_id),
            "mediaId": gid("MediaImage", image_id),
        }],
    });
    let data = execute(client, QUERY, variables).await?;
    user_errors(&data, "productVariantsBulkUpdate")?;
    let media_id = data
        .pointer("/productVariantsBulkUpdate/productVariants/0/media/nodes/0/id")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(AttachEcho {
        media_id,
        image_id: None,
    })
}

/// Attach an existing media object to another product of a split family.
pub(super) async fn attach_media_to_product(
    client: &ShopifyClient,
    product_id: &str,
    media_id: &str,
) -> Result<AttachEcho, ClientError> {
    const QUERY: &str = r#"
        mutation appendProductMedia($productId: ID!, $mediaIds: [ID!]!) {
          productAppendMedia(productId: $productId, mediaIds: $mediaIds) {
            media { id }
            userErrors { message }
          }
        }
    "#;
    let variables = json!({
        "productId": gid("Product", product_id),
        "mediaIds": [gid("MediaImage", media_id)],
    });
    let data = execute(client, QUERY, variables).await?;
    user_errors(&data, "productAppendMedia")?;
    let media_id = data
        .pointer("/productAppendMedia/media/0/id")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(AttachEcho {
        media_id,
        image_id: None,
    })
}

/// Scan one page of metaobject nodes for a record whose display name or
/// `name` field equals `name`.
fn metaobject_matching(connection: &Value, name: &str) -> Option<MetaobjectRef> {
    let nodes = connection.get("nodes").and_then(Value::as_array)?;
    for node in nodes {
        let display_name = node
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let name_field = node
            .get("fields")
            .and_then(Value::as_array)
            .and_then(|fields| {
                fields.iter().find(|f| {
                    f.get("key").and_then(Value::as_str) == Some("name")
                })
            })
            .and_then(|f| f.get("value").and_then(Value::as_str))
            .unwrap_or_default();
        if display_name == name || name_field == name {
            let id = node
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if id.is_empty() {
                continue;
            }
            return Some(MetaobjectRef {
                id: id.to_string(),
                display_name: name.to_string(),
            });
        }
    }
    None
}

fn next_page_cursor(connection: &Value) -> Option<String> {
    let info = connection.get("pageInfo")?;
    if !info
        .get("hasNextPage")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return None;
    }
    info.get("endCursor").and_then(Value::as_str).map(str::to_string)
}

/// Lookup by name must walk every page: the record can live arbitrarily deep
/// in the listing, and a missed hit here would mint a duplicate record in the
/// get-or-create path.
pub(super) async fn find_metaobject(
    client: &ShopifyClient,
    object_type: &str,
    name: &str,
) -> Result<Option<MetaobjectRef>, ClientError> {
    const QUERY: &str = r#"
        query findMetaobjects($type: String!, $after: String) {
          metaobjects(type: $type, first: 100, after: $after) {
            nodes {
              id
              displayName
              fields { key value }
            }
            pageInfo { hasNextPage endCursor }
          }
        }
    "#;
    let mut cursor: Option<String> = None;
    loop {
        let data = execute(
            client,
            QUERY,
            json!({ "type": object_type, "after": cursor }),
        )
        .await?;
        let connection = data.get("metaobjects").cloned().unwrap_or(Value::Null);
        if let Some(found) = metaobject_matching(&connection, name) {
            return Ok(Some(found));
        }
        match next_page_cursor(&connection) {
            Some(next) => cursor = Some(next),
            None => return Ok(None),
        }
    }
}

pub(super) async fn create_metaobject(
    client: &ShopifyClient,
    object_type: &str,
    fields: &[(String, String)],
) -> Result<MetaobjectRef, ClientError> {
    const QUERY: &str = r#"
        mutation createMetaobject($metaobject: MetaobjectCreateInput!) {
          metaobjectCreate(metaobject: $metaobject) {
            metaobject { id displayName }
            userErrors { message }
          }
        }
    "#;
    let field_values: Vec<Value> = fields
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect();
    let variables = json!({
        "metaobject": { "type": object_type, "fields": field_values },
    });
    let data = execute(client, QUERY, variables).await?;
    user_errors(&data, "metaobjectCreate")?;
    let id = data
        .pointer("/metaobjectCreate/metaobject/id")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Request("metaobject create returned no id".into()))?
        .to_string();
    let display_name = data
        .pointer("/metaobjectCreate/metaobject/displayName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(MetaobjectRef { id, display_name })
}

pub(super) async fn update_metaobject(
    client: &ShopifyClient,
    id: &str,
    fields: &[(String, String)],
) -> Result<(), ClientError> {
    const QUERY: &str = r#"
        mutation updateMetaobject($id: ID!, $metaobject: MetaobjectUpdateInput!) {
          metaobjectUpdate(id: $id, metaobject: $metaobject) {
            metaobject { id }
            userErrors { message }
          }
        }
    "#;
    let field_values: Vec<Value> = fields
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect();
    let variables = json!({
        "id": gid("Metaobject", id),
        "metaobject": { "fields": field_values },
    });
    let data = execute(client, QUERY, variables).await?;
    user_errors(&data, "metaobjectUpdate")?;
    Ok(())
}
