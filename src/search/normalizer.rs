//! Query Normalizer
//!
//! Turns loosely typed request parameters into a `SearchRequest`. Pagination
//! input never fails (bad values become 0); malformed filters and unsafe
//! field names do.

use super::sanitizer::sanitize_search_field;
use super::types::{DEFAULT_SEARCH_FIELD, RawSearchParams, SearchRequest};
use crate::error::SearchError;
use crate::store::filters::Filters;

use serde_json::Value;

pub fn normalize(raw: RawSearchParams) -> Result<SearchRequest, SearchError> {
    let search_field = match raw.searchfield.as_deref().map(str::trim) {
        Some(field) if !field.is_empty() => field.to_string(),
        _ => DEFAULT_SEARCH_FIELD.to_string(),
    };
    sanitize_search_field(&search_field)?;

    let filters = Filters::from_value(&decode_text(raw.filters)?)?;
    let filter_fields = parse_filter_fields(raw.filter_fields)?;

    Ok(SearchRequest {
        doctype: raw.doctype.trim().to_string(),
        text: raw.txt.trim().to_string(),
        search_field,
        filters,
        start: coerce_start(raw.start.as_ref()),
        reference_doctype: raw.reference_doctype.filter(|d| !d.trim().is_empty()),
        ignore_permissions: truthy(raw.ignore_user_permissions.as_ref()),
        query: raw.query.filter(|q| !q.trim().is_empty()),
        filter_fields,
        as_dict: truthy(raw.as_dict.as_ref()),
    })
}

/// Integer cast for an offset: numbers are truncated, numeric text parsed,
/// negatives and anything unparseable become 0.
pub fn coerce_start(value: Option<&Value>) -> usize {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match n {
        Some(n) if n.is_finite() && n >= 1.0 => n.trunc() as usize,
        _ => 0,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || coerce_start(Some(&Value::String(s.to_string()))) > 0
        }
        Some(other) => coerce_start(Some(other)) > 0,
        None => false,
    }
}

/// JSON given as text is parsed; structured JSON passes through. Blank text
/// means absent.
fn decode_text(value: Option<Value>) -> Result<Value, SearchError> {
    match value {
        None => Ok(Value::Null),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Value::Null),
        Some(Value::String(text)) => {
            serde_json::from_str(&text).map_err(|e| SearchError::InvalidFilters(e.to_string()))
        }
        Some(other) => Ok(other),
    }
}

/// Extra result fields: a JSON list, JSON-encoded list text, or a
/// comma-separated string. Every name goes through the sanitizer.
fn parse_filter_fields(value: Option<Value>) -> Result<Vec<String>, SearchError> {
    let value = match value {
        Some(Value::String(text)) if !text.trim_start().starts_with('[') => Value::Array(
            text.split(',')
                .map(|f| Value::String(f.trim().to_string()))
                .collect(),
        ),
        other => decode_text(other)?,
    };

    let fields: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|field| field.trim().to_string())
            .filter(|field| !field.is_empty())
            .collect(),
        other => {
            return Err(SearchError::InvalidFilters(format!(
                "filter_fields must be a list, got {}",
                other
            )));
        }
    };

    for field in &fields {
        sanitize_search_field(field)?;
    }
    Ok(fields)
}
