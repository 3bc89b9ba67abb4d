//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SourceConfig;
use crate::engine::{StreamResult, SyncEngine};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::{JsonLinesDestination, JsonlDirDestination};
use crate::pagination::StartLimitPaginator;
use crate::source::{endpoint_with_paginator, pipedrive_source};
use crate::types::ApiKey;
use futures::StreamExt;
use serde_json::{json, Value};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Entity fetched by `check`
const CHECK_ENTITY: &str = "users";

/// CLI runner
///
/// Machine-readable output goes to `out` (stdout for the binary).
pub struct Runner<W: Write + Send = Stdout> {
    cli: Cli,
    out: W,
}

impl Runner<Stdout> {
    /// Create a runner writing to stdout
    pub fn new(cli: Cli) -> Self {
        Self::with_writer(cli, io::stdout())
    }
}

impl<W: Write + Send> Runner<W> {
    /// Create a runner writing to `out`
    pub fn with_writer(cli: Cli, out: W) -> Self {
        Self { cli, out }
    }

    /// Give the output writer back
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Run the CLI command
    ///
    /// Returns `Ok(false)` when the command ran but reported a failure: a
    /// failed connection check or at least one failed stream.
    pub async fn run(&mut self) -> Result<bool> {
        match self.cli.command.clone() {
            Commands::Check => self.check().await,
            Commands::Streams => self.streams().map(|()| true),
            Commands::Read { streams, output } => self.read(streams.as_deref(), output).await,
        }
    }

    /// Load the config file (if any) and apply command-line overrides
    fn load_config(&self) -> Result<SourceConfig> {
        let mut config = match &self.cli.config {
            Some(path) => SourceConfig::from_file(path)?,
            None => SourceConfig::default(),
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }

        Ok(config)
    }

    /// Resolve the API token: command line or environment, then config file
    fn api_key(&self, config: &SourceConfig) -> Result<ApiKey> {
        let key = self
            .cli
            .api_key
            .as_deref()
            .map(ApiKey::new)
            .or_else(|| config.api_key.clone())
            .ok_or_else(|| Error::missing_field("api_key"))?;

        if key.is_blank() {
            return Err(Error::config("api_key must not be blank"));
        }
        Ok(key)
    }

    /// Check connection
    async fn check(&mut self) -> Result<bool> {
        let config = self.load_config()?;
        config.validate(&pipedrive_source())?;
        let api_key = self.api_key(&config)?;
        let client = HttpClient::with_config(config.http_config())?;

        info!("Checking connection to {}", client.base_url());
        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Checking connection to {}", client.base_url())
            }
        }))?;

        let mut pages = endpoint_with_paginator(
            &client,
            CHECK_ENTITY,
            &api_key,
            None,
            StartLimitPaginator::new(1),
        );

        let (succeeded, message) = match pages.next().await.transpose() {
            Ok(_) => (true, "Connection successful".to_string()),
            Err(e) => {
                warn!("Connection check failed: {e}");
                (false, format!("Connection failed: {e}"))
            }
        };

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": if succeeded { "SUCCEEDED" } else { "FAILED" },
                "message": message
            }
        }))?;

        Ok(succeeded)
    }

    /// List available streams
    fn streams(&mut self) -> Result<()> {
        let streams: Vec<Value> = pipedrive_source()
            .iter()
            .map(|r| {
                json!({
                    "name": r.name,
                    "write_disposition": r.write_disposition.to_string(),
                    "parent": r.parent()
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": streams
        }))
    }

    /// Read data
    async fn read(&mut self, streams: Option<&str>, output: Option<PathBuf>) -> Result<bool> {
        let catalog = pipedrive_source();
        let mut config = self.load_config()?;

        if let Some(list) = streams {
            config.streams = parse_stream_list(list);
        }
        if output.is_some() {
            config.output_dir = output;
        }

        config.validate(&catalog)?;
        let api_key = self.api_key(&config)?;
        let client = HttpClient::with_config(config.http_config())?;
        let mut engine = SyncEngine::new(client, api_key).with_config(config.sync_config());

        let pretty = self.cli.format == OutputFormat::Pretty;
        let results = match &config.output_dir {
            Some(dir) => {
                let mut destination = JsonlDirDestination::new(dir)?;
                engine
                    .run(&catalog, &config.streams, &mut destination)
                    .await?
            }
            None => {
                let mut destination = JsonLinesDestination::new(&mut self.out, pretty);
                engine
                    .run(&catalog, &config.streams, &mut destination)
                    .await?
            }
        };

        let succeeded = results.iter().all(StreamResult::is_success);
        let stats = engine.stats();
        info!(
            "Sync finished: {} records, {} streams, {} errors in {}ms",
            stats.records_synced, stats.streams_synced, stats.errors, stats.duration_ms
        );

        self.output_message(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": if succeeded { "SUCCEEDED" } else { "FAILED" },
                "streams": results,
                "stats": stats
            }
        }))?;

        Ok(succeeded)
    }

    /// Output a message
    fn output_message(&mut self, msg: &Value) -> Result<()> {
        let pretty = self.cli.format == OutputFormat::Pretty;
        JsonLinesDestination::new(&mut self.out, pretty).write_value(msg)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Split a comma-separated stream list, ignoring blanks
fn parse_stream_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
