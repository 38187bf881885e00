//! Search Field Sanitizer
//!
//! Field names end up inside store queries, so anything that could break out
//! of an identifier is refused here: quotes, backticks, `;`, `-`, `/`, `*`,
//! `\`, whitespace and every other non-word character. Letters, digits, `_`
//! and the `.` of a `table.field` reference are allowed.

use crate::error::SearchError;

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_.]").expect("search field pattern is valid"));

/// Empty input is accepted; callers substitute the default field.
pub fn sanitize_search_field(field: &str) -> Result<(), SearchError> {
    if field.is_empty() {
        return Ok(());
    }

    if DISALLOWED.is_match(field) {
        tracing::warn!("Rejected search field {:?}", field);
        return Err(SearchError::InvalidField(field.to_string()));
    }

    Ok(())
}
