use super::tokenizer::split_terms;
use super::types::{DEFAULT_SEARCH_FIELD, RecordKey, ResultRecord, SearchRequest};
use crate::error::SearchError;
use crate::store::filters::{FilterClause, FilterOp, Filters};
use crate::store::protocol::{KEY_FIELD, ListQuery, RecordStore};

use serde_json::json;
use std::collections::HashSet;

/// Page size of the listing and final lookup calls.
pub const PAGE_LENGTH: usize = 20;

/// Records of `req.doctype` matching every whitespace-separated term of
/// `req.text` as a substring of `req.search_field`.
///
/// Without text this is a plain filtered listing. With text, each term is
/// looked up separately (keys only), the key sets are intersected, and the
/// surviving keys are fetched in one final call ordered by key.
///
/// `req.start` is applied to every per-term lookup as well as to the final
/// call, so each term's candidate set is paged independently.
pub async fn search(
    store: &dyn RecordStore,
    req: &SearchRequest,
    page_length: usize,
) -> Result<Vec<ResultRecord>, SearchError> {
    let fields = result_fields(&req.search_field, &req.filter_fields);
    let terms = split_terms(&req.text);

    if terms.is_empty() {
        let query = ListQuery::new(fields)
            .filters(req.filters.clone())
            .start(req.start)
            .page_length(page_length)
            .ignore_permissions(true);
        return Ok(store.list_all(&req.doctype, &query).await?);
    }

    let candidates = candidate_keys(store, req, &terms).await?;
    if candidates.is_empty() {
        tracing::debug!("No {} records match all of {:?}", req.doctype, terms);
        return Ok(Vec::new());
    }

    let mut keys: Vec<RecordKey> = candidates.into_iter().collect();
    keys.sort();

    let query = ListQuery::new(fields)
        .filters(Filters::new().with(FilterClause::new(KEY_FIELD, FilterOp::In, json!(keys))))
        .start(req.start)
        .page_length(page_length)
        .order_by("name asc")
        .ignore_permissions(true);

    Ok(store.list_filtered(&req.doctype, &query).await?)
}

/// Intersection of the per-term key sets. Stops early once it is empty.
pub async fn candidate_keys(
    store: &dyn RecordStore,
    req: &SearchRequest,
    terms: &[String],
) -> Result<HashSet<RecordKey>, SearchError> {
    let mut running: Option<HashSet<RecordKey>> = None;

    for term in terms {
        let query = ListQuery::new(vec![KEY_FIELD.to_string()])
            .filters(req.filters.clone())
            .or_filters(vec![FilterClause::contains(&req.search_field, term)])
            .start(req.start)
            .ignore_permissions(true);

        let term_keys: HashSet<RecordKey> = store
            .list_filtered(&req.doctype, &query)
            .await?
            .iter()
            .filter_map(|record| record.name().map(str::to_string))
            .collect();

        tracing::debug!("Term {:?} matched {} {} keys", term, term_keys.len(), req.doctype);

        let next = match running {
            None => term_keys,
            Some(mut current) => {
                current.retain(|key| term_keys.contains(key));
                current
            }
        };

        if next.is_empty() {
            return Ok(next);
        }
        running = Some(next);
    }

    Ok(running.unwrap_or_default())
}

/// `name`, then the search field, then any extra fields, without repeats.
pub fn result_fields(search_field: &str, filter_fields: &[String]) -> Vec<String> {
    let mut fields = vec![KEY_FIELD.to_string()];
    let extra = std::iter::once(search_field)
        .filter(|f| !f.is_empty() && *f != DEFAULT_SEARCH_FIELD)
        .chain(filter_fields.iter().map(String::as_str));

    for field in extra {
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }
    fields
}
