//! Autosuggest Formatting
//!
//! Shapes results for autocomplete widgets and provides the prefix-first
//! ordering used for custom query results.

use super::types::{ResultRecord, Suggestion};
use crate::store::protocol::KEY_FIELD;

use serde_json::Value;

/// One `{value: name, description: ""}` per record, in input order.
pub fn to_suggestions(records: &[ResultRecord]) -> Vec<Suggestion> {
    records
        .iter()
        .map(|record| Suggestion {
            value: value_text(record.get(KEY_FIELD)),
            description: String::new(),
        })
        .collect()
}

/// Something that can be ranked against a lookup term.
pub trait RankValue {
    /// The display value compared with the term.
    fn rank_value(&self) -> String;
}

impl RankValue for ResultRecord {
    fn rank_value(&self) -> String {
        value_text(self.get(KEY_FIELD))
    }
}

/// Positional rows rank on their first column.
impl RankValue for [Value] {
    fn rank_value(&self) -> String {
        value_text(self.first())
    }
}

impl RankValue for Vec<Value> {
    fn rank_value(&self) -> String {
        self.as_slice().rank_value()
    }
}

impl RankValue for str {
    fn rank_value(&self) -> String {
        self.to_string()
    }
}

impl RankValue for String {
    fn rank_value(&self) -> String {
        self.clone()
    }
}

/// Sort key `(does not start with term, value)`; ascending order puts
/// case-insensitive prefix matches first, then compares raw values.
pub fn relevance_rank<C: RankValue + ?Sized>(term: &str, candidate: &C) -> (bool, String) {
    let value = candidate.rank_value();
    let starts = value.to_lowercase().starts_with(&term.to_lowercase());
    (!starts, value)
}

/// Stable in-place sort by `relevance_rank`.
pub fn sort_by_relevance<C: RankValue>(term: &str, rows: &mut [C]) {
    rows.sort_by_cached_key(|row| relevance_rank(term, row));
}

/// Fills a developer-authored query template: `%(key)s` becomes `key` and
/// `%s` becomes `term%` (a "starts with" pattern).
///
/// No escaping happens here. Only use it with templates written by
/// developers and with a `key` that already passed the search-field
/// sanitizer; never build a template from end-user input.
pub fn scrub_query(query: &str, key: &str, term: &str) -> String {
    let mut query = query.to_string();
    if query.contains("%(key)s") {
        query = query.replace("%(key)s", key);
    }
    if query.contains("%s") {
        query = query.replace("%s", &format!("{}%", term));
    }
    query
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
