//! HTTP Router
//!
//! Wires the search, mention and store handlers onto one Axum router. Shared
//! components are installed as `Extension` layers.

use crate::cache::ValueCache;
use crate::mentions::handlers::{handle_get_names_for_mentions, handle_get_names_for_mentions_post};
use crate::mentions::resolver::MentionResolver;
use crate::search::handlers::{
    handle_search_link, handle_search_link_post, handle_search_widget, handle_search_widget_post,
};
use crate::search::queries::QueryRegistry;
use crate::search::service::SearchService;
use crate::store::handlers::{handle_get_record, handle_invalidate_cache, handle_put_record};
use crate::store::memory::MemoryRecordStore;
use crate::store::protocol::RecordStore;

use axum::routing::{delete, get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Components shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryRecordStore>,
    pub search: Arc<SearchService>,
    pub mentions: Arc<MentionResolver>,
}

impl AppState {
    /// Builds the service graph around an in-memory store.
    pub fn new(store: Arc<MemoryRecordStore>, site_url: &str, page_length: usize) -> Self {
        let record_store: Arc<dyn RecordStore> = store.clone();
        let search = SearchService::new(record_store.clone(), QueryRegistry::with_builtins(), page_length);
        let mentions = MentionResolver::new(record_store, ValueCache::new(), site_url);

        Self {
            store,
            search,
            mentions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub doctypes: usize,
    pub records: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handle_health))
        .route(
            "/api/method/search_link",
            get(handle_search_link).post(handle_search_link_post),
        )
        .route(
            "/api/method/search_widget",
            get(handle_search_widget).post(handle_search_widget_post),
        )
        .route(
            "/api/method/get_names_for_mentions",
            get(handle_get_names_for_mentions).post(handle_get_names_for_mentions_post),
        )
        .route("/api/records/:doctype", put(handle_put_record))
        .route("/api/records/:doctype/:name", get(handle_get_record))
        .route("/api/cache/:key", delete(handle_invalidate_cache))
        .layer(Extension(state.store))
        .layer(Extension(state.search))
        .layer(Extension(state.mentions))
}

async fn handle_health(Extension(store): Extension<Arc<MemoryRecordStore>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        doctypes: store.doctype_count(),
        records: store.record_count(),
    })
}
