//! Dependent fan-out
//!
//! Turns a stream of parent pages into the concatenated records of one
//! sub-resource fetch per parent, without ever re-reading the parent
//! collection.

use super::endpoint::endpoint_with_paginator;
use crate::http::HttpClient;
use crate::pagination::{PageStream, StartLimitPaginator};
use crate::types::{ApiKey, Record};
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn};

/// A collection addressed through a parent record, e.g. `deals/{id}/flow`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubResource {
    /// Entity of the parent records
    pub parent_entity: String,
    /// Path segment after the parent id
    pub name: String,
}

impl SubResource {
    /// Create a sub-resource of `parent_entity`
    pub fn new(parent_entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent_entity: parent_entity.into(),
            name: name.into(),
        }
    }

    /// Entity path for one parent
    pub fn path(&self, parent_id: &str) -> String {
        format!("{}/{parent_id}/{}", self.parent_entity, self.name)
    }
}

/// Identifier of a parent record, if it has a usable `id`
pub fn parent_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Fetch `sub_resource` once for every parent record, in parent order
///
/// Parent pages are consumed one at a time as the output is polled. The
/// first error, from the parent stream or any child fetch, is yielded and
/// ends the stream; batches already yielded stay yielded. Parents without
/// an `id` are skipped.
pub fn fan_out(
    parent_pages: PageStream,
    client: HttpClient,
    api_key: ApiKey,
    sub_resource: SubResource,
    paginator: StartLimitPaginator,
) -> PageStream {
    let children = parent_pages
        .map_ok(move |parents| {
            let client = client.clone();
            let api_key = api_key.clone();
            let sub_resource = sub_resource.clone();
            let paginator = paginator.clone();

            let ids: Vec<String> = parents
                .iter()
                .filter_map(|parent| {
                    let id = parent_id(parent);
                    if id.is_none() {
                        warn!(
                            "Skipping {} record without id for {}",
                            sub_resource.parent_entity, sub_resource.name
                        );
                    }
                    id
                })
                .collect();

            stream::iter(ids)
                .map(move |id| {
                    let path = sub_resource.path(&id);
                    debug!("Fetching {path}");
                    endpoint_with_paginator(&client, &path, &api_key, None, paginator.clone())
                })
                .flatten()
        })
        .try_flatten();

    stop_after_error(Box::pin(children))
}

/// Fetch `deals/{id}/participants` for every deal in `deal_pages`
pub fn deals_participants(
    deal_pages: PageStream,
    client: HttpClient,
    api_key: ApiKey,
    paginator: StartLimitPaginator,
) -> PageStream {
    fan_out(
        deal_pages,
        client,
        api_key,
        SubResource::new("deals", "participants"),
        paginator,
    )
}

/// Fetch `deals/{id}/flow` for every deal in `deal_pages`
pub fn deals_flow(
    deal_pages: PageStream,
    client: HttpClient,
    api_key: ApiKey,
    paginator: StartLimitPaginator,
) -> PageStream {
    fan_out(
        deal_pages,
        client,
        api_key,
        SubResource::new("deals", "flow"),
        paginator,
    )
}

/// A stream over one already-fetched page
pub fn single_page(records: Vec<Record>) -> PageStream {
    Box::pin(stream::once(future::ready(Ok(records))))
}

/// End `pages` right after its first error
///
/// Flattened streams keep polling the next inner stream after an inner
/// error; this restores the fail-fast contract of `PageStream`.
fn stop_after_error(pages: PageStream) -> PageStream {
    let fused = pages.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    });
    Box::pin(fused)
}
