use super::memory::MemoryRecordStore;
use super::protocol::ResultRecord;
use crate::mentions::resolver::MentionResolver;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct PutRecordResponse {
    pub success: bool,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetRecordResponse {
    pub record: Option<ResultRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub key: String,
    pub invalidated: bool,
}

pub async fn handle_put_record(
    Extension(store): Extension<Arc<MemoryRecordStore>>,
    Extension(mentions): Extension<Arc<MentionResolver>>,
    Path(doctype): Path<String>,
    Json(record): Json<ResultRecord>,
) -> (StatusCode, Json<PutRecordResponse>) {
    let name = record.name().map(str::to_string);

    match store.upsert(&doctype, record) {
        Ok(_) => {
            mentions.invalidate_for_doctype(&doctype);
            (
                StatusCode::OK,
                Json(PutRecordResponse {
                    success: true,
                    name,
                }),
            )
        }
        Err(e) => {
            tracing::error!("Failed to store {} record: {}", doctype, e);
            (
                StatusCode::BAD_REQUEST,
                Json(PutRecordResponse {
                    success: false,
                    name,
                }),
            )
        }
    }
}

pub async fn handle_get_record(
    Extension(store): Extension<Arc<MemoryRecordStore>>,
    Path((doctype, name)): Path<(String, String)>,
) -> (StatusCode, Json<GetRecordResponse>) {
    match store.get(&doctype, &name) {
        Some(record) => (
            StatusCode::OK,
            Json(GetRecordResponse {
                record: Some(record),
            }),
        ),
        None => (StatusCode::NOT_FOUND, Json(GetRecordResponse { record: None })),
    }
}

pub async fn handle_invalidate_cache(
    Extension(mentions): Extension<Arc<MentionResolver>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<InvalidateResponse>) {
    let invalidated = mentions.cache().invalidate(&key);
    (
        StatusCode::OK,
        Json(InvalidateResponse { key, invalidated }),
    )
}
