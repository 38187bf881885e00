//! Record Store Module
//!
//! The data-access capability the search layer sits in front of.
//!
//! ## Core Concepts
//! - **Protocol**: `RecordStore` is the async trait the search core calls
//!   (`exists`, `list_all`, `list_filtered`). Anything behind it is opaque.
//! - **Filters**: The structured condition language passed with listing calls.
//! - **Memory Store**: `MemoryRecordStore` keeps one table per record type in a
//!   `DashMap` and evaluates filters, ordering, paging and field aliases locally.
//! - **Handlers**: HTTP endpoints for seeding and inspecting records.

pub mod filters;
pub mod handlers;
pub mod memory;
pub mod protocol;


#[cfg(test)]
pub(crate) mod testing;
