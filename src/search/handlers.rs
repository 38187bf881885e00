use super::normalizer::normalize;
use super::service::SearchService;
use super::types::{LinkResponse, RawSearchParams, ResultRecord, WidgetResponse};
use crate::error::SearchError;

use axum::extract::Query;
use axum::{Extension, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

pub async fn handle_search_link(
    Extension(service): Extension<Arc<SearchService>>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<LinkResponse>, SearchError> {
    search_link(service, params).await
}

pub async fn handle_search_link_post(
    Extension(service): Extension<Arc<SearchService>>,
    Json(params): Json<RawSearchParams>,
) -> Result<Json<LinkResponse>, SearchError> {
    search_link(service, params).await
}

pub async fn handle_search_widget(
    Extension(service): Extension<Arc<SearchService>>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<WidgetResponse>, SearchError> {
    search_widget(service, params).await
}

pub async fn handle_search_widget_post(
    Extension(service): Extension<Arc<SearchService>>,
    Json(params): Json<RawSearchParams>,
) -> Result<Json<WidgetResponse>, SearchError> {
    search_widget(service, params).await
}

async fn search_link(
    service: Arc<SearchService>,
    params: RawSearchParams,
) -> Result<Json<LinkResponse>, SearchError> {
    let span = request_span("search_link", &params);
    async move {
        let results = service.search_link(params).await?;
        tracing::debug!("Returning {} suggestions", results.len());
        Ok(Json(LinkResponse { results }))
    }
    .instrument(span)
    .await
}

async fn search_widget(
    service: Arc<SearchService>,
    params: RawSearchParams,
) -> Result<Json<WidgetResponse>, SearchError> {
    let span = request_span("search_widget", &params);
    async move {
        let req = normalize(params)?;
        let records = service.run(&req).await?;
        tracing::debug!("Returning {} records", records.len());
        Ok(Json(WidgetResponse {
            values: shape_values(records, req.as_dict),
        }))
    }
    .instrument(span)
    .await
}

fn request_span(method: &'static str, params: &RawSearchParams) -> tracing::Span {
    tracing::info_span!(
        "search",
        method,
        request_id = %uuid::Uuid::new_v4(),
        doctype = %params.doctype,
    )
}

fn shape_values(records: Vec<ResultRecord>, as_dict: bool) -> Vec<Value> {
    records
        .into_iter()
        .map(|record| {
            if as_dict {
                Value::Object(record.0)
            } else {
                Value::Array(record.to_row())
            }
        })
        .collect()
}

