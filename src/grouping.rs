//! Grouping records tie the products of a split family back together.
//!
//! A grouping is a platform metaobject created before any member product
//! exists, so every member can carry a reference to it from the moment it is
//! created. Membership is written once at the end of the family, replacing
//! whatever the record held before.

use crate::shopify::client::CatalogApi;
use crate::shopify::error::ClientError;
use crate::shopify::types::MetaobjectRef;
use tracing::info;

pub const GROUPING_TYPE: &str = "product_grouping";

/// Find the grouping record for `name`, creating it if absent. Lookup is by
/// the record's `name` field, so re-running an import reuses the same record.
pub async fn ensure_grouping_record<C: CatalogApi>(
    client: &C,
    name: &str,
) -> Result<MetaobjectRef, ClientError> {
    if let Some(existing) = client.find_metaobject(GROUPING_TYPE, name).await? {
        return Ok(existing);
    }
    let created = client
        .create_metaobject(GROUPING_TYPE, &[("name".to_string(), name.to_string())])
        .await?;
    info!(
        target = "feedsync.grouping",
        name = name,
        id = %created.id,
        "grouping_record_created"
    );
    Ok(created)
}

/// Write the final membership of a grouping record. The product list and
/// count replace the previous values wholesale; partial membership left by an
/// interrupted earlier run does not survive a completed one.
pub async fn finalize_grouping_record<C: CatalogApi>(
    client: &C,
    grouping_id: &str,
    product_ids: &[String],
) -> Result<(), ClientError> {
    let products = serde_json::to_string(product_ids)
        .map_err(|err| ClientError::Request(format!("grouping membership encode: {err}")))?;
    client
        .update_metaobject(
            grouping_id,
            &[
                ("products".to_string(), products),
                ("product_count".to_string(), product_ids.len().to_string()),
            ],
        )
        .await?;
    info!(
        target = "feedsync.grouping",
        id = grouping_id,
        members = product_ids.len(),
        "grouping_record_finalized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::testing::FakeCatalog;

    #[tokio::test]
    async fn ensure_is_idempotent_by_name() {
        let fake = FakeCatalog::new();
        let first = ensure_grouping_record(&fake, "Trail Jacket")
            .await
            .expect("create");
        let second = ensure_grouping_record(&fake, "Trail Jacket")
            .await
            .expect("reuse");
        assert_eq!(first.id, second.id);
        assert_eq!(fake.metaobjects().len(), 1);
    }

    #[tokio::test]
    async fn distinct_names_get_distinct_records() {
        let fake = FakeCatalog::new();
        let a = ensure_grouping_record(&fake, "Trail Jacket").await.expect("a");
        let b = ensure_grouping_record(&fake, "Summit Pants").await.expect("b");
        assert_ne!(a.id, b.id);
        assert_eq!(fake.metaobjects().len(), 2);
    }

    #[tokio::test]
    async fn finalize_replaces_membership() {
        let fake = FakeCatalog::new();
        let record = ensure_grouping_record(&fake, "Trail Jacket")
            .await
            .expect("create");

        finalize_grouping_record(&fake, &record.id, &["1".to_string()])
            .await
            .expect("first finalize");
        finalize_grouping_record(
            &fake,
            &record.id,
            &["1".to_string(), "2".to_string(), "3".to_string()],
        )
        .await
        .expect("second finalize");

        let stored = fake.metaobjects().into_iter().next().expect("record");
        let products = stored
            .fields
            .iter()
            .find(|(key, _)| key == "products")
            .map(|(_, value)| value.clone())
            .expect("products field");
        assert_eq!(products, r#"["1","2","3"]"#);
        let count = stored
            .fields
            .iter()
            .find(|(key, _)| key == "product_count")
            .map(|(_, value)| value.clone())
            .expect("count field");
        assert_eq!(count, "3");
    }
}
