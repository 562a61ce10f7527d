//! Incremental NDJSON/SSE decoding for chat response streams
//!
//! Network chunks arrive at arbitrary boundaries: a multi-byte UTF-8
//! sequence or a JSON line can be split across two reads. The decoder
//! carries both kinds of partial state between [`StreamDecoder::push_bytes`]
//! calls so every complete line is parsed exactly once.

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::event::StreamEvent;

/// Stateful decoder for one stream session
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk
    carry: Vec<u8>,
    /// Decoded text after the last newline seen so far
    line_buffer: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk and return every event it completes,
    /// in line order.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.decode_utf8(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=newline).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush the trailing fragment on clean stream end. An incomplete UTF-8
    /// tail with no complete character is dropped.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        self.carry.clear();
        let rest = std::mem::take(&mut self.line_buffer);
        parse_line(&rest)
    }

    /// Append a chunk to the line buffer, holding back any incomplete
    /// trailing sequence instead of replacing it.
    fn decode_utf8(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.line_buffer.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.line_buffer.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        // truly invalid bytes become replacement characters
                        Some(invalid) => {
                            self.line_buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        }
                        // a sequence cut off by the chunk boundary waits
                        // for the next read
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Parse one complete line into an event. Returns `None` for lines that
/// carry nothing: blanks, the `[DONE]` sentinel, and malformed JSON.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    // tolerate SSE-framed lines alongside plain NDJSON
    let data = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    };
    if data == "[DONE]" {
        debug!("Received stream end marker");
        return None;
    }
    match serde_json::from_str::<Value>(data) {
        Ok(value) => Some(StreamEvent::from_value(value)),
        Err(e) => {
            warn!("Skipping malformed stream line: {} - Error: {}", data, e);
            None
        }
    }
}
