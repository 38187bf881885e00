//! Custom Query Registry
//!
//! Maps query names (the `query` request parameter) to async functions that
//! produce result records themselves instead of going through the
//! intersection engine. Only code registers queries, so a request can select
//! one but never define one.

use super::types::ResultRecord;
use crate::error::SearchError;
use crate::mentions::types::{RESERVED_USERS, USER_DOCTYPE};
use crate::store::filters::{FilterClause, FilterOp, Filters};
use crate::store::protocol::{ListQuery, RecordStore};

use anyhow::Result;
use dashmap::DashMap;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Name of the built-in user lookup.
pub const USER_QUERY: &str = "user_query";

/// Everything a custom query gets to work with.
#[derive(Debug, Clone)]
pub struct CustomQueryArgs {
    pub doctype: String,
    pub txt: String,
    pub search_field: String,
    pub start: usize,
    pub page_length: usize,
    pub filters: Filters,
    pub reference_doctype: Option<String>,
}

/// Type-erased async query function.
pub type CustomQueryFn = Arc<
    dyn Fn(Arc<dyn RecordStore>, CustomQueryArgs) -> Pin<Box<dyn Future<Output = Result<Vec<ResultRecord>>> + Send>>
        + Send
        + Sync,
>;

pub struct QueryRegistry {
    queries: DashMap<String, CustomQueryFn>,
}

impl QueryRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queries: DashMap::new(),
        })
    }

    /// Registry preloaded with the built-in queries.
    pub fn with_builtins() -> Arc<Self> {
        let registry = Self::new();
        registry.register(USER_QUERY, user_query);
        registry
    }

    pub fn register<F, Fut>(&self, name: &str, query: F)
    where
        F: Fn(Arc<dyn RecordStore>, CustomQueryArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<ResultRecord>>> + Send + 'static,
    {
        let query_fn: CustomQueryFn = Arc::new(move |store, args| {
            Box::pin(query(store, args))
                as Pin<Box<dyn Future<Output = Result<Vec<ResultRecord>>> + Send>>
        });

        self.queries.insert(name.to_string(), query_fn);

        tracing::info!("Registered search query: {}", name);
    }

    /// Runs the query registered under `name`.
    pub async fn execute(
        &self,
        name: &str,
        store: Arc<dyn RecordStore>,
        args: CustomQueryArgs,
    ) -> Result<Vec<ResultRecord>, SearchError> {
        // Clone out of the map so no shard lock is held across the await.
        let query_fn = self
            .queries
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SearchError::UnknownQuery(name.to_string()))?;

        tracing::debug!("Running search query '{}' on {}", name, args.doctype);
        Ok(query_fn(store, args).await?)
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn list_queries(&self) -> Vec<String> {
        self.queries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self {
            queries: DashMap::new(),
        }
    }
}

/// Enabled users whose id or full name contains the text, excluding the
/// reserved built-in accounts.
pub async fn user_query(
    store: Arc<dyn RecordStore>,
    args: CustomQueryArgs,
) -> Result<Vec<ResultRecord>> {
    let filters = args
        .filters
        .clone()
        .with(FilterClause::new("enabled", FilterOp::Eq, json!(1)))
        .with(FilterClause::new("name", FilterOp::NotIn, json!(RESERVED_USERS)));

    let mut or_filters = vec![FilterClause::contains("name", &args.txt)];
    if args.search_field != "name" {
        or_filters.push(FilterClause::contains(&args.search_field, &args.txt));
    }
    or_filters.push(FilterClause::contains("full_name", &args.txt));

    let query = ListQuery::new(vec!["name".into(), "full_name".into()])
        .filters(filters)
        .or_filters(or_filters)
        .start(args.start)
        .page_length(args.page_length)
        .ignore_permissions(true);

    store.list_filtered(USER_DOCTYPE, &query).await
}
