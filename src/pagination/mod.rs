//! Pagination module
//!
//! Pipedrive v1 list endpoints page with `start`/`limit` and report
//! `more_items_in_collection` / `next_start` in `additional_data.pagination`.
//!
//! # Overview
//!
//! - `StartLimitPaginator` turns a page's metadata into the next request
//! - `paginated_get` is the fetch loop, exposed as a lazy `PageStream`

mod stream;
mod strategies;
mod types;

pub use stream::{paginated_get, PageStream};
pub use strategies::{StartLimitPaginator, DEFAULT_PAGE_LIMIT};
pub use types::{AdditionalData, NextPage, PageBody, PaginationMeta, PaginationState, Paginator};

#[cfg(test)]
mod tests;
