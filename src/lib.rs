//! Link Search Library
//!
//! A text-search and autosuggest layer in front of a generic record store.
//! It serves the small, ranked, paginated result sets that link pickers,
//! search boxes and @mention pickers need.
//!
//! ## Architecture Modules
//! - **`search`**: Link-field search. Normalizes requests, sanitizes the search
//!   field, intersects per-term lookups and formats suggestions.
//! - **`mentions`**: @mention autocomplete over a cached roster of users and
//!   user groups.
//! - **`store`**: The `RecordStore` capability consumed by both pipelines, plus
//!   an in-memory implementation with its own filter evaluator.
//! - **`cache`**: Pull-through cache injected into the mention resolver.
//! - **`routes`**, **`config`**, **`logging`**, **`error`**: Service plumbing.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod mentions;
pub mod routes;
pub mod search;
pub mod store;
