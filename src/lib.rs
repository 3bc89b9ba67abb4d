// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Pipedrive Source
//!
//! Lazily extracts Pipedrive CRM collections over the v1 REST API.
//!
//! ## Features
//!
//! - **Cursor pagination**: follows `additional_data.pagination` until the
//!   collection is exhausted, one request at a time
//! - **Endpoint builder**: authenticated, paginated stream for any entity
//! - **Fan-out**: per-record sub-resource fetches (deal participants, deal flow)
//! - **Sync engine**: runs the catalog into stdout or per-stream JSONL files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use pipedrive_source::{endpoint, ApiKey, HttpClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HttpClient::new()?;
//!     let api_key = ApiKey::new("...");
//!
//!     let mut deals = endpoint(&client, "deals", &api_key, None);
//!     while let Some(page) = deals.try_next().await? {
//!         println!("{} deals", page.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     CLI (check/streams/read)                  │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │          SyncEngine: catalog → Destination (stdout/JSONL)     │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌────────────────┬─────────────┴──────────┬───────────────────┐
//! │      HTTP      │       Pagination       │      Source       │
//! ├────────────────┼────────────────────────┼───────────────────┤
//! │ GET + headers  │ start/limit            │ endpoint()        │
//! │ non-2xx fatal  │ more_items/next_start  │ fan_out()         │
//! │ no retries     │ lazy PageStream        │ catalog           │
//! └────────────────┴────────────────────────┴───────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client
pub mod http;

/// Start/limit pagination and page streams
pub mod pagination;

/// Endpoint builder, fan-out and stream catalog
pub mod source;

/// Main execution engine
pub mod engine;

/// Message destinations
pub mod output;

/// Source configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::SourceConfig;
pub use engine::{Message, SyncConfig, SyncEngine};
pub use http::HttpClient;
pub use pagination::PageStream;
pub use source::{endpoint, fan_out, pipedrive_source, ResourceDef, SubResource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
