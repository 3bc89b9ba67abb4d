//! JSON-lines writers

use super::Destination;
use crate::engine::Message;
use crate::error::{Error, Result, ResultExt};
use crate::types::{Record, WriteDisposition};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// RECORD message for one record
pub fn record_line(stream: &str, record: &Record, emitted_at_ms: i64) -> Value {
    json!({
        "type": "RECORD",
        "record": {
            "stream": stream,
            "data": record,
            "emitted_at": emitted_at_ms
        }
    })
}

// ============================================================================
// Writer Destination
// ============================================================================

/// Writes every message as one JSON line
pub struct JsonLinesDestination<W: Write + Send> {
    writer: W,
    pretty: bool,
}

impl JsonLinesDestination<Stdout> {
    /// Destination writing to stdout
    pub fn stdout(pretty: bool) -> Self {
        Self::new(io::stdout(), pretty)
    }
}

impl<W: Write + Send> JsonLinesDestination<W> {
    /// Destination writing to `writer`
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    /// Give the writer back
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write one JSON value followed by a newline
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, value)?;
        } else {
            serde_json::to_writer(&mut self.writer, value)?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> Destination for JsonLinesDestination<W> {
    async fn begin_stream(&mut self, _stream: &str, _disposition: WriteDisposition) -> Result<()> {
        Ok(())
    }

    async fn write(&mut self, message: &Message) -> Result<()> {
        match message {
            Message::Record {
                stream,
                records,
                emitted_at,
            } => {
                let emitted_at_ms = emitted_at.timestamp_millis();
                for record in records {
                    self.write_value(&record_line(stream, record, emitted_at_ms))?;
                }
            }
            Message::Log { level, message } => {
                self.write_value(&json!({
                    "type": "LOG",
                    "log": {
                        "level": level.as_str(),
                        "message": message
                    }
                }))?;
            }
        }
        Ok(())
    }

    async fn end_stream(&mut self, _stream: &str, _succeeded: bool) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// Directory Destination
// ============================================================================

/// A stream file being written
struct OpenStream {
    writer: BufWriter<File>,
    /// Staging file renamed over `path` on success (replace disposition)
    staging: Option<PathBuf>,
    path: PathBuf,
}

/// Writes the records of each stream to `{dir}/{stream}.jsonl`
///
/// With `Replace`, records go to a staging file that replaces the previous
/// file only when the stream succeeds; a failed stream leaves the previous
/// run's file in place. With `Append`, records are appended directly.
/// Log messages are not written.
pub struct JsonlDirDestination {
    dir: PathBuf,
    open: HashMap<String, OpenStream>,
}

impl JsonlDirDestination {
    /// Create the destination, creating `dir` if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            open: HashMap::new(),
        })
    }

    /// Final file of `stream`
    pub fn stream_path(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{stream}.jsonl"))
    }
}

#[async_trait]
impl Destination for JsonlDirDestination {
    async fn begin_stream(&mut self, stream: &str, disposition: WriteDisposition) -> Result<()> {
        let path = self.stream_path(stream);

        let (file, staging) = match disposition {
            WriteDisposition::Replace => {
                let staging = self.dir.join(format!("{stream}.jsonl.tmp"));
                let file = File::create(&staging)
                    .with_context(|| format!("Failed to create {}", staging.display()))?;
                (file, Some(staging))
            }
            WriteDisposition::Append => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                (file, None)
            }
        };

        debug!("Writing {stream} to {} ({disposition})", path.display());
        self.open.insert(
            stream.to_string(),
            OpenStream {
                writer: BufWriter::new(file),
                staging,
                path,
            },
        );
        Ok(())
    }

    async fn write(&mut self, message: &Message) -> Result<()> {
        let Message::Record {
            stream, records, ..
        } = message
        else {
            return Ok(());
        };

        let open = self
            .open
            .get_mut(stream)
            .ok_or_else(|| Error::Other(format!("Stream '{stream}' was not started")))?;

        for record in records {
            serde_json::to_writer(&mut open.writer, record)?;
            open.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    async fn end_stream(&mut self, stream: &str, succeeded: bool) -> Result<()> {
        let Some(mut open) = self.open.remove(stream) else {
            return Ok(());
        };
        open.writer.flush()?;
        drop(open.writer);

        if let Some(staging) = open.staging {
            if succeeded {
                fs::rename(&staging, &open.path)
                    .with_context(|| format!("Failed to replace {}", open.path.display()))?;
            } else {
                fs::remove_file(&staging)?;
            }
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        for open in self.open.values_mut() {
            open.writer.flush()?;
        }
        Ok(())
    }
}
