//! Engine types
//!
//! Message types, configuration and results for the sync engine.

use crate::pagination::DEFAULT_PAGE_LIMIT;
use crate::types::{LogLevel, Record};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One page worth of records
    Record {
        /// Stream name
        stream: String,
        /// Records in API order
        records: Vec<Record>,
        /// When the batch left the engine
        emitted_at: DateTime<Utc>,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, records: Vec<Record>) -> Self {
        Self::Record {
            stream: stream.into(),
            records,
            emitted_at: Utc::now(),
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create an error log
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Stream name of a record message
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Record { stream, .. } => Some(stream),
            Self::Log { .. } => None,
        }
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Records requested per page
    pub page_limit: u32,
    /// Stop the whole run at the first failed stream
    pub fail_fast: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            fail_fast: false,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size
    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Outcome of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    /// Every page was fetched and written
    Success,
    /// The stream was aborted by an error
    Failed,
}

/// Per-stream result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamResult {
    /// Stream name
    pub stream: String,
    /// Final status
    pub status: StreamStatus,
    /// Records written before the stream ended
    pub records_synced: usize,
    /// Wall time of the sync group the stream ran in
    pub duration_ms: u64,
    /// Error message for failed streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamResult {
    /// A successful stream
    pub fn success(stream: impl Into<String>, records_synced: usize, duration_ms: u64) -> Self {
        Self {
            stream: stream.into(),
            status: StreamStatus::Success,
            records_synced,
            duration_ms,
            error: None,
        }
    }

    /// A failed stream
    pub fn failed(
        stream: impl Into<String>,
        records_synced: usize,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            stream: stream.into(),
            status: StreamStatus::Failed,
            records_synced,
            duration_ms,
            error: Some(error.into()),
        }
    }

    /// Whether the stream succeeded
    pub fn is_success(&self) -> bool {
        self.status == StreamStatus::Success
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Non-empty pages received, parents and children
    pub pages_fetched: usize,
    /// Streams that completed
    pub streams_synced: usize,
    /// Streams that failed
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
