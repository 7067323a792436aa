//! In-memory [`CatalogApi`] fake for tests: records every call in order,
//! counts uploads, and lets tests script attach failures per call.

use super::client::CatalogApi;
use super::error::ClientError;
use super::types::{
    AttachEcho, CreatedProduct, CreatedVariant, MediaRef, Metafield, MetaobjectRef, NewImage,
    NewMedia, ProductDraft, ProductImage,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub(crate) struct FakeMetaobject {
    pub id: String,
    pub object_type: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    operations: Vec<String>,
    products: Vec<CreatedProduct>,
    images: HashMap<String, Vec<ProductImage>>,
    metaobjects: Vec<FakeMetaobject>,
    metafields: HashMap<String, Vec<Metafield>>,
    assignments: HashMap<String, String>,
    product_media: HashMap<String, Vec<String>>,
    create_image_calls: usize,
    create_media_calls: usize,
    attach_errors: VecDeque<ClientError>,
    disabled_methods: HashSet<&'static str>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeCatalog {
    state: Arc<Mutex<State>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().operations.clone()
    }

    pub fn create_image_calls(&self) -> usize {
        self.state.lock().unwrap().create_image_calls
    }

    pub fn create_media_calls(&self) -> usize {
        self.state.lock().unwrap().create_media_calls
    }

    pub fn metaobjects(&self) -> Vec<FakeMetaobject> {
        self.state.lock().unwrap().metaobjects.clone()
    }

    pub fn assignments(&self) -> HashMap<String, String> {
        self.state.lock().unwrap().assignments.clone()
    }

    pub fn product_count(&self) -> usize {
        self.state.lock().unwrap().products.len()
    }

    pub fn metafields_for(&self, product_id: &str) -> Vec<Metafield> {
        self.state
            .lock()
            .unwrap()
            .metafields
            .get(product_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Queue an error for the next attach call; errors are consumed in FIFO
    /// order across all four attach shapes.
    pub fn push_attach_error(&self, error: ClientError) {
        self.state.lock().unwrap().attach_errors.push_back(error);
    }

    /// Make one attach shape permanently fail with a validation error.
    pub fn disable_method(&self, method: &'static str) {
        self.state.lock().unwrap().disabled_methods.insert(method);
    }

    fn fresh_id(state: &mut State) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    fn attach(
        &self,
        method: &'static str,
        record: impl FnOnce(&mut State),
        echo: AttachEcho,
    ) -> Result<AttachEcho, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(method.to_string());
        if let Some(err) = state.attach_errors.pop_front() {
            return Err(err);
        }
        if state.disabled_methods.contains(method) {
            return Err(ClientError::Validation(format!("{method} not supported")));
        }
        record(&mut state);
        Ok(echo)
    }
}

impl CatalogApi for FakeCatalog {
    async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<CreatedProduct>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("find_product_by_handle".into());
        Ok(state
            .products
            .iter()
            .find(|p| p.handle == handle)
            .cloned())
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<CreatedProduct, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("create_product".into());
        let product_id = Self::fresh_id(&mut state).to_string();
        let variants = draft
            .variants
            .iter()
            .map(|v| CreatedVariant {
                id: Self::fresh_id(&mut state).to_string(),
                sku: v.sku.clone(),
                title: format!("{} / {}", v.color, v.size),
            })
            .collect();
        let created = CreatedProduct {
            id: product_id.clone(),
            handle: draft.handle.clone(),
            title: draft.title.clone(),
            variants,
        };
        state.products.push(created.clone());
        state
            .metafields
            .entry(product_id)
            .or_default()
            .extend(draft.metafields.iter().cloned());
        Ok(created)
    }

    async fn get_product_images(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProductImage>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("get_product_images".into());
        Ok(state.images.get(product_id).cloned().unwrap_or_default())
    }

    async fn create_image(
        &self,
        product_id: &str,
        image: &NewImage,
    ) -> Result<ProductImage, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("create_image".into());
        state.create_image_calls += 1;
        let created = ProductImage {
            id: format!("img-{}", Self::fresh_id(&mut state)),
            src: image.src.clone(),
            alt: image.alt.clone(),
            position: image.position.unwrap_or(0),
        };
        state
            .images
            .entry(product_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn create_media(
        &self,
        _product_id: &str,
        media: &NewMedia,
    ) -> Result<MediaRef, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("create_media".into());
        state.create_media_calls += 1;
        Ok(MediaRef {
            id: format!("media-{}", Self::fresh_id(&mut state)),
            preview_url: Some(media.original_source.clone()),
        })
    }

    async fn find_image_by_source(
        &self,
        source_url: &str,
    ) -> Result<Option<ProductImage>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("find_image_by_source".into());
        Ok(state
            .images
            .values()
            .flatten()
            .find(|img| img.src == source_url)
            .cloned())
    }

    async fn append_variant_media(
        &self,
        _product_id: &str,
        variant_id: &str,
        media_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        let variant_id = variant_id.to_string();
        let media = media_id.to_string();
        self.attach(
            "append_variant_media",
            move |state| {
                state.assignments.insert(variant_id, media);
            },
            AttachEcho {
                media_id: Some(media_id.to_string()),
                image_id: None,
            },
        )
    }

    async fn bulk_update_variant_image(
        &self,
        _product_id: &str,
        variant_id: &str,
        image_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        let variant_id = variant_id.to_string();
        let image = image_id.to_string();
        self.attach(
            "bulk_update_variant_image",
            move |state| {
                state.assignments.insert(variant_id, image);
            },
            AttachEcho {
                media_id: Some(image_id.to_string()),
                image_id: None,
            },
        )
    }

    async fn update_variant_image(
        &self,
        variant_id: &str,
        image_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        let variant_id = variant_id.to_string();
        let image = image_id.to_string();
        self.attach(
            "update_variant_image",
            move |state| {
                state.assignments.insert(variant_id, image);
            },
            AttachEcho {
                media_id: None,
                image_id: Some(image_id.to_string()),
            },
        )
    }

    async fn attach_media_to_product(
        &self,
        product_id: &str,
        media_id: &str,
    ) -> Result<AttachEcho, ClientError> {
        let product_id = product_id.to_string();
        let media = media_id.to_string();
        self.attach(
            "attach_media_to_product",
            move |state| {
                state.product_media.entry(product_id).or_default().push(media);
            },
            AttachEcho {
                media_id: Some(media_id.to_string()),
                image_id: None,
            },
        )
    }

    async fn set_metafield(
        &self,
        product_id: &str,
        metafield: &Metafield,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("set_metafield".into());
        state
            .metafields
            .entry(product_id.to_string())
            .or_default()
            .push(metafield.clone());
        Ok(())
    }

    async fn find_metaobject(
        &self,
        object_type: &str,
        name: &str,
    ) -> Result<Option<MetaobjectRef>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("find_metaobject".into());
        Ok(state
            .metaobjects
            .iter()
            .find(|mo| {
                mo.object_type == object_type
                    && mo
                        .fields
                        .iter()
                        .any(|(key, value)| key == "name" && value == name)
            })
            .map(|mo| MetaobjectRef {
                id: mo.id.clone(),
                display_name: name.to_string(),
            }))
    }

    async fn create_metaobject(
        &self,
        object_type: &str,
        fields: &[(String, String)],
    ) -> Result<MetaobjectRef, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("create_metaobject".into());
        let id = format!("metaobject-{}", Self::fresh_id(&mut state));
        let display_name = fields
            .iter()
            .find(|(key, _)| key == "name")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        state.metaobjects.push(FakeMetaobject {
            id: id.clone(),
            object_type: object_type.to_string(),
            fields: fields.to_vec(),
        });
        Ok(MetaobjectRef { id, display_name })
    }

    async fn update_metaobject(
        &self,
        id: &str,
        fields: &[(String, String)],
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push("update_metaobject".into());
        let Some(record) = state.metaobjects.iter_mut().find(|mo| mo.id == id) else {
            return Err(ClientError::Validation(format!("no metaobject {id}")));
        };
        for (key, value) in fields {
            if let Some(existing) = record.fields.iter_mut().find(|(k, _)| k == key) {
                existing.1 = value.clone();
            } else {
                record.fields.push((key.clone(), value.clone()));
            }
        }
        Ok(())
    }
}
