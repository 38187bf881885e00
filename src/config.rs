//! Service Configuration
//!
//! Command-line flags with environment-variable fallbacks.

use crate::search::engine::PAGE_LENGTH;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "link_search", version, about = "Link-field and @mention search service")]
pub struct ServiceConfig {
    /// Address the HTTP server listens on.
    #[arg(long, env = "LINK_SEARCH_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Public base URL used to build form links for mentions.
    #[arg(long, env = "LINK_SEARCH_SITE_URL", default_value = "http://localhost:8000")]
    pub site_url: String,

    /// Page size of listing and final lookup calls.
    #[arg(long, env = "LINK_SEARCH_PAGE_LENGTH", default_value_t = PAGE_LENGTH)]
    pub page_length: usize,

    /// JSON file of `{doctype: [records]}` loaded into the store at startup.
    #[arg(long, env = "LINK_SEARCH_FIXTURES")]
    pub fixtures: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "LINK_SEARCH_LOG", default_value = "link_search=info")]
    pub log: String,
}
