//! Record Store Protocol
//!
//! The capability the search layer consumes. Filter evaluation, permission
//! checks and the storage engine all live behind this trait; the search
//! core only decides which listing calls to make and how to combine them.

use super::filters::{FilterClause, Filters};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the primary key of every record.
pub const KEY_FIELD: &str = "name";

/// Opaque record identifier (the record's `name`).
pub type RecordKey = String;

/// A single record as returned by the store: requested field names mapped to
/// values, in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(pub Map<String, Value>);

impl ResultRecord {
    /// The record key, if present and textual.
    pub fn name(&self) -> Option<&str> {
        self.0.get(KEY_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Values in field order, for callers that asked for positional rows.
    pub fn to_row(&self) -> Vec<Value> {
        self.0.values().cloned().collect()
    }
}

/// Arguments of a single listing call.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// All clauses must hold.
    pub filters: Filters,
    /// At least one clause must hold (ignored when empty and by `list_all`).
    pub or_filters: Vec<FilterClause>,
    /// Fields to return. Entries may use `"source as alias"`. Empty means
    /// just the key field.
    pub fields: Vec<String>,
    pub start: usize,
    /// `None` means no limit.
    pub page_length: Option<usize>,
    /// `"field"` or `"field asc|desc"`. `None` keeps store-native order.
    pub order_by: Option<String>,
    pub ignore_permissions: bool,
}

impl ListQuery {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn or_filters(mut self, or_filters: Vec<FilterClause>) -> Self {
        self.or_filters = or_filters;
        self
    }

    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn page_length(mut self, page_length: usize) -> Self {
        self.page_length = Some(page_length);
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }

    pub fn ignore_permissions(mut self, ignore: bool) -> Self {
        self.ignore_permissions = ignore;
        self
    }
}

/// Data-access layer over typed records.
///
/// Implementations own retries, timeouts and permission enforcement; errors
/// are returned as-is to the search layer, which does not retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether the record type is known to the store.
    async fn exists(&self, doctype: &str) -> Result<bool>;

    /// Listing restricted only by `query.filters`; `or_filters` are ignored.
    async fn list_all(&self, doctype: &str, query: &ListQuery) -> Result<Vec<ResultRecord>>;

    /// Listing restricted by `query.filters` and, when non-empty,
    /// `query.or_filters`.
    async fn list_filtered(&self, doctype: &str, query: &ListQuery) -> Result<Vec<ResultRecord>>;
}
