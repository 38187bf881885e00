//! Mention Resolver Module
//!
//! Autocomplete for `@mentions`: a roster of users and user groups, loaded in
//! bulk from the record store, cached process-wide, then filtered by a partial
//! display-name term on every request.
//!
//! ## Submodules
//! - **`types`**: `MentionCandidate` and the cache keys / record types involved.
//! - **`loaders`**: Bulk queries that build each candidate pool.
//! - **`resolver`**: Cache-backed filtering, link building and ordering.
//! - **`handlers`**: The `get_names_for_mentions` HTTP endpoint.

pub mod handlers;
pub mod loaders;
pub mod resolver;
pub mod types;
