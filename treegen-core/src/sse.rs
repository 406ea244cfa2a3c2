//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; [`EventDecoder::feed`] buffers the
//! current line and returns every event completed by the chunk. Line endings
//! may be LF, CR, or CRLF, and a CRLF may be split across two chunks.
//!
//! ```
//! use treegen_core::sse::EventDecoder;
//!
//! let mut decoder = EventDecoder::new();
//! assert!(decoder.feed(b"data: tree_0").is_empty());
//! let events = decoder.feed(b".png\n\n");
//! assert_eq!(events[0].data, "tree_0.png");
//! assert_eq!(events[0].event, "message");
//! ```

const BOM: &str = "\u{feff}";

/// Event type used when the stream does not name one
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Streaming parser state
#[derive(Debug, Default)]
pub struct EventDecoder {
    line: Vec<u8>,
    data: String,
    event_type: String,
    last_event_id: String,
    retry_ms: Option<u64>,
    pending_cr: bool,
    seen_first_line: bool,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return the events it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();

        for &byte in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut out),
                b'\r' => {
                    self.end_line(&mut out);
                    self.pending_cr = true;
                }
                _ => self.line.push(byte),
            }
        }

        out
    }

    /// Signal end of input. An event without its terminating blank line is discarded.
    pub fn finish(&mut self) {
        self.line.clear();
        self.data.clear();
        self.event_type.clear();
        self.pending_cr = false;
    }

    /// Reconnection delay announced by the server, if any
    pub fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }

    pub fn last_event_id(&self) -> Option<&str> {
        (!self.last_event_id.is_empty()).then_some(self.last_event_id.as_str())
    }

    fn end_line(&mut self, out: &mut Vec<SseEvent>) {
        let raw = std::mem::take(&mut self.line);
        let mut line = String::from_utf8_lossy(&raw).into_owned();

        if !self.seen_first_line {
            self.seen_first_line = true;
            if let Some(stripped) = line.strip_prefix(BOM) {
                line = stripped.to_string();
            }
        }

        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                out.push(event);
            }
            return;
        }

        // Comment line
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = value.to_string(),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = value.to_string();
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.retry_ms = value.parse().ok();
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = std::mem::take(&mut self.event_type);

        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }

        Some(SseEvent {
            event: if event_type.is_empty() {
                DEFAULT_EVENT_TYPE.to_string()
            } else {
                event_type
            },
            data,
            id: self.last_event_id().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<SseEvent> {
        let mut decoder = EventDecoder::new();
        chunks.iter().flat_map(|c| decoder.feed(c)).collect()
    }

    #[test]
    fn relay_frames_decode_to_filenames() {
        let events = decode_all(&[b"data: tree_1.png\n\ndata: tree_2.png\n\n"]);
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["tree_1.png", "tree_2.png"]);
        assert!(events.iter().all(|e| e.event == "message"));
    }

    #[test]
    fn chunk_boundaries_do_not_matter() {
        let stream = b"data: a.png\r\n\r\nevent: status\ndata: x\n\ndata: b.png\r\n\r\n";
        let whole = decode_all(&[stream]);

        let bytes: Vec<&[u8]> = stream.chunks(1).collect();
        let split = decode_all(&bytes);

        assert_eq!(whole, split);
        assert_eq!(whole.len(), 3);
        assert_eq!(whole[1].event, "status");
    }

    #[test]
    fn crlf_split_across_chunks_is_one_line_ending() {
        let events = decode_all(&[b"data: a\r", b"\n\r", b"\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a");
    }

    #[test]
    fn bare_cr_terminates_lines() {
        let events = decode_all(&[b"data: a\r\rdata: b\r\r"]);
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["a", "b"]);
    }

    #[test]
    fn multiline_data_is_joined_with_newline() {
        let events = decode_all(&[b"data: first\ndata:second\n\n"]);
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn comments_and_empty_events_are_skipped() {
        let events = decode_all(&[b": keep-alive\n\nevent: ping\n\ndata: a.png\n\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a.png");
        // The event type of an undispatched block does not leak into the next one
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn id_and_retry_fields() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"id: 7\nretry: 3000\ndata: a\n\nretry: soon\ndata: b\n\n");
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(events[1].id.as_deref(), Some("7"));
        assert_eq!(decoder.retry_ms(), Some(3000));
    }

    #[test]
    fn leading_bom_is_dropped() {
        let events = decode_all(&["\u{feff}data: a\n\n".as_bytes()]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a");
    }

    #[test]
    fn field_without_colon_has_empty_value() {
        let events = decode_all(&[b"data\n\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "");
    }

    #[test]
    fn unterminated_event_is_discarded_on_finish() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: partial\n").is_empty());
        decoder.finish();
        assert!(decoder.feed(b"\n").is_empty());
    }

    #[test]
    fn utf8_split_across_chunks() {
        let text = "data: ärbol.png\n\n".as_bytes();
        let (a, b) = text.split_at(7);
        let events = decode_all(&[a, b]);
        assert_eq!(events[0].data, "ärbol.png");
    }
}
