use super::error::ClientError;
use super::types::{
    AttachEcho, CreatedProduct, MediaRef, Metafield, MetaobjectRef, NewImage, NewMedia,
    ProductDraft, ProductImage,
};
use super::{graphql, rest};
use crate::config;
use crate::http::build_client;
use reqwest::Client;

/// Operations the import core needs from the remote catalog platform.
///
/// The trait is the seam between the import engine and the Admin API: tests
/// inject an in-memory fake, production wires in [`ShopifyClient`]. Every
/// method returns a pre-classified [`ClientError`] so callers never inspect
/// raw message text.
#[allow(async_fn_in_trait)]
pub trait CatalogApi {
    async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<CreatedProduct>, ClientError>;
    async fn create_product(&self, draft: &ProductDraft) -> Result<CreatedProduct, ClientError>;
    async fn get_product_images(&self, product_id: &str)
    -> Result<Vec<ProductImage>, ClientError>;
    async fn create_image(
        &self,
        product_id: &str,
        image: &NewImage,
    ) -> Result<ProductImage, ClientError>;
    async fn create_media(
        &self,
        product_id: &str,
        media: &NewMedia,
    ) -> Result<MediaRef, ClientError>;
    /// Remote-wide lookup of an already-uploaded image by its original source
    /// URL. Reusing the existing asset avoids the uniqueness suffix the
    /// platform appends to filenames on physical re-upload.
    async fn find_image_by_source(
        &self,
        source_url: &str,
    ) -> Result<Option<ProductImage>, ClientError>;
    async fn append_variant_media(
        &self,
        product_id: &str,
        variant_id: &str,
        media_id: &str,
    ) -> Result<AttachEcho, ClientError>;
    async fn bulk_update_variant_image(
        &self,
        product_id: &str,
        variant_id: &str,
        image_id: &str,
    ) -> Result<AttachEcho, ClientError>;
    async fn update_variant_image(
        &self,
        variant_id: &str,
        image_id: &str,
    ) -> Result<AttachEcho, ClientError>;
    async fn attach_media_to_product(
        &self,
        product_id: &str,
        media_id: &str,
    ) -> Result<AttachEcho, ClientError>;
    async fn set_metafield(
        &self,
        product_id: &str,
        metafield: &Metafield,
    ) -> Result<(), ClientError>;
    async fn find_metaobject(
        &self,
        object_type: &str,
        name: &str,
    ) -> Result<Option<MetaobjectRef>, ClientError>;
    async fn create_metaobject(
        &self,
        object_type: &str,
        fields: &[(String, String)],
    ) -> Result<MetaobjectRef, ClientError>;
    async fn update_metaobject(
        &self,
        id: &str,
        fields: &[(String, String)],
    ) -> Result<(), ClientError>;
}

/// Admin API client: REST for products, images and metafields, GraphQL for
/// media, metaobjects and variant attach shapes.
#[derive(Clone)]
pub struct ShopifyClient {
    pub(super) http: Client,
    pub(super) base: String,
    pub(super) token: String,
}

impl ShopifyClient {
    pub fn new(domain: &str, token: &str, api_version: &str) -> Self {
        Self {
            http: build_client(),
            base: format!("https://{domain}/admin/api/{api_version}"),
            token: token.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let domain = config::SHOP_DOMAIN.clone();
        if domain.trim().is_empty() {
            return Err(ClientError::Request("SHOP_DOMAIN is not set".into()));
        }
        let token = config::ADMIN_TOKEN.clone();
        if token.trim().is_empty() {
            return Err(ClientError::Request("SHOP_ADMIN_TOKEN is not set".into()));
        }
        Ok(Self::new(&domain, &token, &config::API_VERSION))
    }

    pub(super) fn rest_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    pub(super) fn graphql_url(&self) -> String {
        format!("{}/graphql.json", self.base)
    }
}

impl CatalogApi for ShopifyClient {
    async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<CreatedProduct>, ClientError> {
        rest::find_product_by_handle(self, handle).await
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<CreatedProduct, ClientError> {
        rest::create_product(self, draft).await
    }

    async fn get_product_images(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProductImage>, ClientError> {
        rest::get_product_images(self, product_id).await
    }

    async fn create_image(
        &self,
        product_id: &str,
        image: &NewImage,
    ) -> Result<ProductImage, ClientError> {
        rest::create_image(self, product_id, image).await
    }

    async fn create_media(
        &self,
        product_id: &str,
        media: &NewMedia,
    ) -> Result<MediaRef, ClientError> {
        graphql::create_media(self, product_id, media).await
    }

    async fn find_image_by_source(
        &self,
        source_url: &str,
    ) -> Result<Option<ProductImage>, ClientError> {
        graphql::find_image_by_source(self, source_url).await
    }

    async fn append_variant_media(
        &self,
        product_id: &str,
        variant_id: &str,
        media_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        graphql::append_variant_media(self, product_id, variant_id, media_id).await
    }

    async fn bulk_update_variant_image(
        &self,
        product_id: &str,
        variant_id: &str,
        image_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        graphql::bulk_update_variant_image(self, product_id, variant_id, image_id).await
    }

    async fn update_variant_image(
        &self,
        variant_id: &str,
        image_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        rest::update_variant_image(self, variant_id, image_id).await
    }

    async fn attach_media_to_product(
        &self,
        product_id: &str,
        media_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        graphql::attach_media_to_product(self, product_id, media_id).await
    }

    async fn set_metafield(
        &self,
        product_id: &str,
        metafield: &Metafield,
    ) -> Result<(), ClientError> {
        rest::set_metafield(self, product_id, metafield).await
    }

    async fn find_metaobject(
        &self,
        object_type: &str,
        name: &str,
    ) -> Result<Option<MetaobjectRef>, ClientError> {
        graphql::find_metaobject(self, object_type, name).await
    }

    async fn create_metaobject(
        &self,
        object_type: &str,
        fields: &[(String, String)],
    ) -> Result<MetaobjectRef, ClientError> {
        graphql::create_metaobject(self, object_type, fields).await
    }

    async fn update_metaobject(
        &self,
        id: &str,
        fields: &[(String, String)],
    ) -> Result<(), ClientError> {
        graphql::update_metaobject(self, id, fields).await
    }
}
