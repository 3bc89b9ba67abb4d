//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine walks the catalog in order. Each top-level resource is synced
//! together with the resources that depend on it: the parent's pages are
//! fetched once, written (if the parent is selected), and then handed page by
//! page to every selected dependent's fan-out.

mod types;

pub use types::{Message, StreamResult, StreamStatus, SyncConfig, SyncStats};

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::Destination;
use crate::pagination::StartLimitPaginator;
use crate::source::{
    endpoint_with_paginator, fan_out, single_page, validate_catalog, validate_selection,
    ResourceDef, ResourceKind, SubResource,
};
use crate::types::{ApiKey, Record};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Credential passed to every endpoint call
    api_key: ApiKey,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, api_key: ApiKey) -> Self {
        Self {
            client,
            api_key,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    fn paginator(&self) -> StartLimitPaginator {
        StartLimitPaginator::new(self.config.page_limit)
    }

    /// Sync the selected streams of `resources` into `destination`
    ///
    /// An empty `selection` means every stream. A dependent stream pulls in
    /// its parent's fetch even when the parent itself is not selected; the
    /// parent's records are then not written.
    ///
    /// Failures flow from parent to dependents: a failed parent fetch fails
    /// the parent and every dependent. A failed dependent fails only that
    /// dependent; the parent keeps paginating and the other dependents keep
    /// receiving its pages. Either way the run moves on to the next
    /// top-level resource, unless `fail_fast` is set, in which case the
    /// first error fails its whole group and is returned.
    pub async fn run(
        &mut self,
        resources: &[ResourceDef],
        selection: &[String],
        destination: &mut dyn Destination,
    ) -> Result<Vec<StreamResult>> {
        validate_catalog(resources)?;
        validate_selection(resources, selection)?;

        let run_start = Instant::now();
        let selected = |name: &str| selection.is_empty() || selection.iter().any(|s| s == name);
        let mut results = Vec::new();

        for parent in resources.iter().filter(|r| !r.is_dependent()) {
            let dependents: Vec<&ResourceDef> = resources
                .iter()
                .filter(|r| r.parent() == Some(parent.name.as_str()) && selected(&r.name))
                .collect();
            let emit_parent = selected(&parent.name);

            if !emit_parent && dependents.is_empty() {
                continue;
            }

            let streams: Vec<&ResourceDef> = emit_parent
                .then_some(parent)
                .into_iter()
                .chain(dependents.iter().copied())
                .collect();

            for stream in &streams {
                info!("Starting sync for stream: {}", stream.name);
                destination
                    .begin_stream(&stream.name, stream.write_disposition)
                    .await?;
                destination
                    .write(&Message::info(format!(
                        "Starting sync for stream: {}",
                        stream.name
                    )))
                    .await?;
            }

            let group_start = Instant::now();
            let mut counts = BTreeMap::new();
            let mut failed = BTreeMap::new();
            let group_error = self
                .sync_group(
                    parent,
                    emit_parent,
                    &dependents,
                    destination,
                    &mut counts,
                    &mut failed,
                )
                .await
                .err();
            let duration_ms = group_start.elapsed().as_millis() as u64;

            for stream in &streams {
                let records = counts.get(&stream.name).copied().unwrap_or(0);

                match group_error.as_ref().or_else(|| failed.get(&stream.name)) {
                    None => {
                        destination.end_stream(&stream.name, true).await?;
                        destination
                            .write(&Message::info(format!(
                                "Completed sync for {}: {records} records",
                                stream.name
                            )))
                            .await?;
                        info!("Completed sync for {}: {records} records", stream.name);
                        self.stats.add_stream();
                        results.push(StreamResult::success(&stream.name, records, duration_ms));
                    }
                    Some(e) => {
                        warn!("Error syncing stream {}: {e}", stream.name);
                        destination.end_stream(&stream.name, false).await?;
                        destination
                            .write(&Message::error(format!(
                                "Error syncing stream {}: {e}",
                                stream.name
                            )))
                            .await?;
                        self.stats.add_error();
                        results.push(StreamResult::failed(
                            &stream.name,
                            records,
                            duration_ms,
                            e.to_string(),
                        ));
                    }
                }
            }

            if let Some(e) = group_error {
                if self.config.fail_fast {
                    self.stats
                        .set_duration(run_start.elapsed().as_millis() as u64);
                    destination.finish().await?;
                    return Err(e);
                }
            }
        }

        destination.finish().await?;
        self.stats
            .set_duration(run_start.elapsed().as_millis() as u64);

        Ok(results)
    }

    /// Fetch one parent collection and feed each page to its dependents
    ///
    /// Returns the parent's error. Dependent errors land in `failed` and
    /// that dependent receives no further pages; with `fail_fast` they are
    /// returned instead.
    async fn sync_group(
        &mut self,
        parent: &ResourceDef,
        emit_parent: bool,
        dependents: &[&ResourceDef],
        destination: &mut dyn Destination,
        counts: &mut BTreeMap<String, usize>,
        failed: &mut BTreeMap<String, Error>,
    ) -> Result<()> {
        let ResourceKind::Endpoint {
            entity,
            extra_params,
        } = &parent.kind
        else {
            return Err(Error::config(format!(
                "Resource '{}' is not a top-level endpoint",
                parent.name
            )));
        };

        let mut pages = endpoint_with_paginator(
            &self.client,
            entity,
            &self.api_key,
            Some(extra_params),
            self.paginator(),
        );

        while let Some(page) = pages.next().await {
            let page = page?;

            if emit_parent {
                self.emit(&parent.name, page.clone(), destination, counts)
                    .await?;
            }

            for dependent in dependents {
                let ResourceKind::Dependent { sub_resource, .. } = &dependent.kind else {
                    continue;
                };
                if failed.contains_key(&dependent.name) {
                    continue;
                }

                let outcome = self
                    .sync_dependent(&dependent.name, sub_resource, &page, destination, counts)
                    .await;
                if let Err(e) = outcome {
                    if self.config.fail_fast {
                        return Err(e);
                    }
                    warn!("Stopping stream {} after error: {e}", dependent.name);
                    failed.insert(dependent.name.clone(), e);
                }
            }

            // Nothing left to feed
            if !emit_parent && dependents.iter().all(|d| failed.contains_key(&d.name)) {
                break;
            }
        }

        Ok(())
    }

    /// Fan one parent page out to a dependent stream
    async fn sync_dependent(
        &mut self,
        stream: &str,
        sub_resource: &SubResource,
        parents: &[Record],
        destination: &mut dyn Destination,
        counts: &mut BTreeMap<String, usize>,
    ) -> Result<()> {
        let mut children = fan_out(
            single_page(parents.to_vec()),
            self.client.clone(),
            self.api_key.clone(),
            sub_resource.clone(),
            self.paginator(),
        );

        while let Some(batch) = children.next().await {
            self.emit(stream, batch?, destination, counts).await?;
        }
        Ok(())
    }

    async fn emit(
        &mut self,
        stream: &str,
        records: Vec<Record>,
        destination: &mut dyn Destination,
        counts: &mut BTreeMap<String, usize>,
    ) -> Result<()> {
        let count = records.len();
        destination.write(&Message::record(stream, records)).await?;

        *counts.entry(stream.to_string()).or_default() += count;
        self.stats.add_page();
        self.stats.add_records(count);
        Ok(())
    }
}
