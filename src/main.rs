use std::net::SocketAddr;

use anyhow::Context;
use bookstore_for_warp::{build_service, config::Settings, Bookstore, InMemoryCatalog, SEED_CATALOG};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstore_for_warp=info,warp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::parse();

    let catalog = match &settings.catalog {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            InMemoryCatalog::from_json(&json)
                .with_context(|| format!("parsing catalog {}", path.display()))?
        }
        None => InMemoryCatalog::from_json(SEED_CATALOG).context("parsing bundled catalog")?,
    };

    let store = Bookstore::in_memory(settings.auth_config(), catalog);

    let addr = SocketAddr::new(settings.host, settings.port);
    tracing::info!("Book Store API listening on http://{}", addr);

    warp::serve(build_service(&store)).run(addr).await;

    Ok(())
}
