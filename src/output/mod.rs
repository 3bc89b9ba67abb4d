//! Output module
//!
//! Destinations receive every message the engine emits.
//!
//! # Overview
//!
//! - `JsonLinesDestination` writes RECORD and LOG messages as JSON lines to
//!   any writer (stdout for the CLI)
//! - `JsonlDirDestination` writes one `{stream}.jsonl` file per stream and
//!   honours the stream's write disposition
//! - `Vec<Message>` collects messages in memory

mod writer;

pub use writer::{record_line, JsonLinesDestination, JsonlDirDestination};

use crate::engine::Message;
use crate::error::Result;
use crate::types::WriteDisposition;
use async_trait::async_trait;

/// Sink for engine messages
#[async_trait]
pub trait Destination: Send {
    /// Called once before the first message of `stream`
    async fn begin_stream(&mut self, stream: &str, disposition: WriteDisposition) -> Result<()>;

    /// Write one message
    async fn write(&mut self, message: &Message) -> Result<()>;

    /// Called once after the last message of `stream`
    async fn end_stream(&mut self, stream: &str, succeeded: bool) -> Result<()>;

    /// Flush everything at the end of a run
    async fn finish(&mut self) -> Result<()>;
}

#[async_trait]
impl Destination for Vec<Message> {
    async fn begin_stream(&mut self, _stream: &str, _disposition: WriteDisposition) -> Result<()> {
        Ok(())
    }

    async fn write(&mut self, message: &Message) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }

    async fn end_stream(&mut self, _stream: &str, _succeeded: bool) -> Result<()> {
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
