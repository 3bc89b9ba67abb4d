//! Pipedrive source
//!
//! # Overview
//!
//! - `endpoint` builds the authenticated request for one entity and returns
//!   its lazy page stream
//! - `fan_out` (and `deals_participants` / `deals_flow`) fetches a
//!   sub-resource per parent record, consuming the parent one page at a time
//! - `pipedrive_source` lists every stream the source produces

mod catalog;
mod endpoint;
mod fanout;

pub use catalog::{
    pipedrive_source, validate_catalog, validate_selection, ResourceDef, ResourceKind,
    SIMPLE_ENDPOINTS,
};
pub use endpoint::{endpoint, endpoint_with_paginator, API_TOKEN_PARAM};
pub use fanout::{deals_flow, deals_participants, fan_out, parent_id, single_page, SubResource};
