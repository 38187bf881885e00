use crate::store::filters::Filters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::store::protocol::{RecordKey, ResultRecord};

/// Search field used when the caller does not name one.
pub const DEFAULT_SEARCH_FIELD: &str = "name";

/// Request parameters exactly as a caller sends them, before normalization.
///
/// Loosely typed on purpose: query strings carry everything as text, JSON
/// bodies may carry structured filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    #[serde(default)]
    pub doctype: String,
    #[serde(default)]
    pub txt: String,
    pub query: Option<String>,
    #[serde(alias = "search_field")]
    pub searchfield: Option<String>,
    pub start: Option<Value>,
    pub filters: Option<Value>,
    pub filter_fields: Option<Value>,
    pub as_dict: Option<Value>,
    pub reference_doctype: Option<String>,
    pub ignore_user_permissions: Option<Value>,
}

/// Canonical search request handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub doctype: String,
    /// Free text, already trimmed.
    pub text: String,
    /// Always passed the search-field sanitizer.
    pub search_field: String,
    pub filters: Filters,
    pub start: usize,
    pub reference_doctype: Option<String>,
    pub ignore_permissions: bool,
    /// Name of a registered custom query to run instead of the engine.
    pub query: Option<String>,
    /// Extra fields to return with each record.
    pub filter_fields: Vec<String>,
    /// Return records as objects rather than positional rows.
    pub as_dict: bool,
}

impl SearchRequest {
    pub fn new(doctype: &str, text: &str) -> Self {
        Self {
            doctype: doctype.to_string(),
            text: text.trim().to_string(),
            search_field: DEFAULT_SEARCH_FIELD.to_string(),
            filters: Filters::new(),
            start: 0,
            reference_doctype: None,
            ignore_permissions: false,
            query: None,
            filter_fields: Vec::new(),
            as_dict: false,
        }
    }
}

/// Minimal shape consumed by link-field autocomplete widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub results: Vec<Suggestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WidgetResponse {
    /// Objects when `as_dict` was requested, positional arrays otherwise.
    pub values: Vec<Value>,
}
