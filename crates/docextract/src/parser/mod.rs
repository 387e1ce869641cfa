//! Parsing collaborator interface.
//!
//! The orchestrator treats document parsing as an opaque capability behind
//! [`DocumentParser`]. A parser sniffs content types, fills a [`MetadataMap`]
//! and writes body text into a [`ContentSink`]; it reports failures through
//! the tagged [`ParseFault`] enum.
//!
//! [`BuiltinParser`] is the engine shipped with this crate. Embedders can
//! plug in their own implementation through
//! [`Orchestrator::new`](crate::core::orchestrator::Orchestrator::new).
//!
//! # Thread Safety
//!
//! Parsers are shared across requests as `Arc<dyn DocumentParser>` and must be
//! `Send + Sync`. All per-request state (metadata, sink) is passed in by the
//! caller, so implementations should hold no mutable state of their own.

mod builtin;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

pub use builtin::BuiltinParser;

use std::io::Read;

use crate::detection::DetectionStrategy;
use crate::error::ParseFault;
use crate::types::MetadataMap;

/// A document parsing engine.
pub trait DocumentParser: Send + Sync {
    /// Short identifier used in logs and `/info`.
    fn name(&self) -> &str {
        "custom"
    }

    /// Sniff the content type of `content`.
    ///
    /// `metadata` carries request-derived hints such as `resourceName`.
    fn detect(&self, content: &[u8], metadata: &MetadataMap) -> String;

    /// Parse the document read from `reader`.
    ///
    /// The content type must be taken from `detection`, which either reports
    /// the client-declared type or calls back into [`detect`](Self::detect).
    /// This call blocks until parsing completes or faults.
    fn parse(
        &self,
        reader: &mut dyn Read,
        sink: &mut ContentSink,
        metadata: &mut MetadataMap,
        detection: &DetectionStrategy,
    ) -> Result<(), ParseFault>;
}

/// Receives body text produced by a parser.
///
/// A discarding sink is used for metadata-only requests; parsers may check
/// [`is_discarding`](Self::is_discarding) to skip text extraction entirely.
#[derive(Debug)]
pub struct ContentSink {
    mode: SinkMode,
    buffer: String,
    write_limit: Option<usize>,
    written_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkMode {
    Discard,
    Buffer,
}

impl ContentSink {
    /// Sink that drops all text.
    pub fn discard() -> Self {
        Self {
            mode: SinkMode::Discard,
            buffer: String::new(),
            write_limit: None,
            written_chars: 0,
        }
    }

    /// Sink that buffers text in memory, optionally capped at `write_limit` characters.
    pub fn buffer(write_limit: Option<usize>) -> Self {
        Self {
            mode: SinkMode::Buffer,
            buffer: String::new(),
            write_limit,
            written_chars: 0,
        }
    }

    pub fn is_discarding(&self) -> bool {
        self.mode == SinkMode::Discard
    }

    /// Append `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFault::ContentHandler`] once the write limit is exceeded;
    /// text up to the limit is kept.
    pub fn write_str(&mut self, text: &str) -> Result<(), ParseFault> {
        if self.mode == SinkMode::Discard {
            return Ok(());
        }

        let incoming = text.chars().count();
        if let Some(limit) = self.write_limit
            && self.written_chars + incoming > limit
        {
            let remaining = limit.saturating_sub(self.written_chars);
            self.buffer.extend(text.chars().take(remaining));
            self.written_chars = limit;
            return Err(ParseFault::ContentHandler(format!(
                "Your document contained more than {} characters, and so your requested limit has been reached",
                limit
            )));
        }

        self.buffer.push_str(text);
        self.written_chars += incoming;
        Ok(())
    }

    /// Buffered text; empty for a discarding sink.
    pub fn into_text(self) -> String {
        self.buffer
    }
}

/// Add `content_type` to the metadata unless that exact value is already present.
pub(crate) fn record_content_type(metadata: &mut MetadataMap, content_type: &str) {
    if !metadata.contains_value(crate::types::CONTENT_TYPE, content_type) {
        metadata.add(crate::types::CONTENT_TYPE, content_type);
    }
}
