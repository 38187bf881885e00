//! Link Search Module
//!
//! Answers "which records of type T match this partial text" for link fields
//! and search boxes.
//!
//! ## Pipeline
//! 1. **Normalize**: raw parameters become a `SearchRequest` (filters parsed,
//!    offset coerced, search field defaulted and sanitized).
//! 2. **Search**: each whitespace-separated term is looked up on its own and
//!    the key sets are intersected, so results match *all* terms.
//! 3. **Format**: records are returned as-is or reshaped into suggestions.
//!
//! ## Submodules
//! - **`sanitizer`**: Character policy for search field names.
//! - **`normalizer`**: Request coercion and validation.
//! - **`tokenizer`**: Splits free text into terms.
//! - **`engine`**: Per-term lookups and key-set intersection.
//! - **`suggest`**: Suggestion shape, relevance ordering, query templating.
//! - **`queries`**: Registry of named custom queries.
//! - **`service`**: The `search_widget` / `search_link` entry points.
//! - **`handlers`**: HTTP handlers for the Axum router.
//! - **`types`**: Request and response types.

pub mod engine;
pub mod handlers;
pub mod normalizer;
pub mod queries;
pub mod sanitizer;
pub mod service;
pub mod suggest;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;
