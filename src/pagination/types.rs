//! Pagination types and traits
//!
//! Response envelope of a Pipedrive list endpoint and the state tracked
//! while walking its pages.

use crate::error::Result;
use crate::types::{Record, StringMap};
use serde::Deserialize;
use serde_json::Value;

/// Body of one list response
///
/// ```json
/// {
///   "success": true,
///   "data": [ ... ],
///   "additional_data": {
///     "pagination": { "start": 0, "limit": 500, "more_items_in_collection": true, "next_start": 500 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageBody {
    /// Record batch; `null` is an empty batch, a missing field is a parse error
    pub data: Value,
    /// Envelope metadata
    #[serde(default)]
    pub additional_data: Option<AdditionalData>,
}

/// `additional_data` section of a list response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalData {
    /// Pagination metadata, absent on unpaginated endpoints
    #[serde(default)]
    pub pagination: Option<PaginationMeta>,
}

/// `additional_data.pagination` section of a list response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaginationMeta {
    /// Offset the server used for this page
    #[serde(default)]
    pub start: Option<u64>,
    /// Page size the server used for this page
    #[serde(default)]
    pub limit: Option<u64>,
    /// Whether another page exists; absent or `null` means `false`
    #[serde(default)]
    pub more_items_in_collection: Option<bool>,
    /// Offset to request next, present when more items exist
    #[serde(default)]
    pub next_start: Option<u64>,
}

impl PaginationMeta {
    /// Whether the server reported another page
    pub fn has_more(&self) -> bool {
        self.more_items_in_collection.unwrap_or(false)
    }
}

impl PageBody {
    /// Pagination metadata, or the all-defaults value when absent
    pub fn pagination(&self) -> PaginationMeta {
        self.additional_data
            .as_ref()
            .and_then(|a| a.pagination.clone())
            .unwrap_or_default()
    }

    /// Take the record batch out of the body
    ///
    /// Arrays keep their element order. A bare object counts as one record,
    /// an empty object or `null` as no records.
    pub fn into_records(self) -> Vec<Record> {
        match self.data {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            Value::Object(map) if map.is_empty() => Vec::new(),
            other => vec![other],
        }
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available starting at this offset
    Continue {
        /// Value for the `start` parameter of the next request
        start: u64,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Offset for the next request
    pub start: u64,
    /// Pages fetched so far (including empty ones)
    pub pages_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state at offset zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Record one fetched page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameters for the request described by `state`
    fn request_params(&self, state: &PaginationState) -> StringMap;

    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        pagination: &PaginationMeta,
        state: &mut PaginationState,
    ) -> Result<NextPage>;
}
