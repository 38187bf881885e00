use super::resolver::MentionResolver;
use super::types::MentionCandidate;
use crate::error::SearchError;

use axum::extract::Query;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct MentionParams {
    #[serde(default)]
    pub search_term: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MentionResponse {
    pub message: Vec<MentionCandidate>,
}

pub async fn handle_get_names_for_mentions(
    Extension(resolver): Extension<Arc<MentionResolver>>,
    Query(params): Query<MentionParams>,
) -> Result<Json<MentionResponse>, SearchError> {
    get_names_for_mentions(resolver, params).await
}

pub async fn handle_get_names_for_mentions_post(
    Extension(resolver): Extension<Arc<MentionResolver>>,
    Json(params): Json<MentionParams>,
) -> Result<Json<MentionResponse>, SearchError> {
    get_names_for_mentions(resolver, params).await
}

async fn get_names_for_mentions(
    resolver: Arc<MentionResolver>,
    params: MentionParams,
) -> Result<Json<MentionResponse>, SearchError> {
    let message = resolver.find_mentions(&params.search_term).await?;
    Ok(Json(MentionResponse { message }))
}
