//! Source configuration
//!
//! `SourceConfig` is loaded from YAML. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration.

use crate::engine::SyncConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, DEFAULT_BASE_URL};
use crate::pagination::DEFAULT_PAGE_LIMIT;
use crate::source::{validate_selection, ResourceDef};
use crate::types::ApiKey;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for one run of the source
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// API token; the command line and environment take precedence
    #[serde(default)]
    pub api_key: Option<ApiKey>,

    /// API root every entity path is joined to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records requested per page
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Streams to sync (empty = all)
    #[serde(default)]
    pub streams: Vec<String>,

    /// Write `{stream}.jsonl` files here instead of stdout
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Abort the run at the first failed stream
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            timeout_secs: default_timeout_secs(),
            streams: Vec::new(),
            output_dir: None,
            fail_fast: false,
        }
    }
}

impl SourceConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Check values against the catalog the run will use
    pub fn validate(&self, catalog: &[ResourceDef]) -> Result<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        let parsed = url::Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.page_limit == 0 {
            return Err(Error::config("page_limit must be greater than 0"));
        }

        validate_selection(catalog, &self.streams)
    }

    /// HTTP client settings
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(self.base_url.trim())
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }

    /// Engine settings
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_page_limit(self.page_limit)
            .with_fail_fast(self.fail_fast)
    }
}
