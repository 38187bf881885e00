use clap::Parser;
use link_search::config::ServiceConfig;
use link_search::logging;
use link_search::routes::{AppState, build_router};
use link_search::store::memory::MemoryRecordStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();
    logging::init(&config.log);

    // 1. Record store:
    let store = Arc::new(MemoryRecordStore::new());
    if let Some(path) = &config.fixtures {
        store.load_fixtures(path)?;
    }

    // 2. Search + mention services:
    let state = AppState::new(store, &config.site_url, config.page_length);
    tracing::info!(
        "Search page length {}, mention links under {}",
        state.search.page_length(),
        config.site_url
    );

    // 3. HTTP server:
    let app = build_router(state);

    tracing::info!("HTTP server listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
