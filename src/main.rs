mod assign;
mod config;
mod feed;
mod grouping;
mod http;
mod pipeline;
mod shopify;
mod split;
mod transform;

use chrono::Utc;
use eyre::WrapErr;
use pipeline::{ImportOptions, Importer};
use shopify::client::ShopifyClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let client = ShopifyClient::from_env().wrap_err("shop credentials")?;
    let urls = config::feed_urls();
    if urls.is_empty() {
        eyre::bail!("no feed URLs configured (set FEED_URL_EN and/or FEED_URL_FI)");
    }

    let run_id = Uuid::new_v4();
    let started = Utc::now();
    info!(target = "feedsync", run_id = %run_id, "import_run_started");

    let mut importer = Importer::new(client, ImportOptions::from_env());
    for url in urls {
        info!(target = "feedsync", run_id = %run_id, url = %url, "importing_feed");
        let products = feed::fetch_feed(&url)
            .await
            .wrap_err_with(|| format!("feed {url}"))?;
        let summary = importer.run(&products).await;
        summary.log();
    }

    info!(
        target = "feedsync",
        run_id = %run_id,
        elapsed_s = (Utc::now() - started).num_seconds(),
        "import_run_complete"
    );
    Ok(())
}
