//! Server-Sent Events frame decoder.
//!
//! Turns the raw body of a `text/event-stream` response into events. Lines
//! may end in `\n`, `\r\n` or `\r`, and chunk boundaries may fall anywhere,
//! including between the two bytes of a `\r\n` or inside a UTF-8 sequence.
//! `retry` fields are ignored; reconnect timing belongs to the adapter.

use thiserror::Error;

/// Event type used when a frame names none.
pub const DEFAULT_EVENT: &str = "message";

/// Largest event (pending line plus accumulated data) the decoder buffers.
pub const DEFAULT_MAX_EVENT_BYTES: usize = 1024 * 1024;

/// The server sent more than the decoder is willing to buffer for one event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event exceeds {limit} bytes without completing")]
pub struct EventTooLarge {
    pub limit: usize,
}

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// Whether this is an unnamed (`message`) event.
    pub fn is_message(&self) -> bool {
        self.event == DEFAULT_EVENT
    }
}

/// Incremental decoder; feed it body chunks as they arrive.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: String,
    has_data: bool,
    event: Option<String>,
    last_event_id: Option<String>,
    max_event_bytes: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_EVENT_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_event_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: String::new(),
            has_data: false,
            event: None,
            last_event_id: None,
            max_event_bytes,
        }
    }

    /// Decode a chunk, returning every event it completes.
    ///
    /// # Errors
    ///
    /// Returns [`EventTooLarge`] once the incomplete event held in memory
    /// outgrows the limit. The decoder should be dropped along with the
    /// connection.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, EventTooLarge> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        loop {
            let Some(pos) = self.buffer.iter().position(|b| *b == b'\n' || *b == b'\r') else {
                break;
            };
            let terminator_len = if self.buffer[pos] == b'\r' {
                match self.buffer.get(pos + 1) {
                    // Could be the first half of \r\n; wait for more bytes.
                    None => break,
                    Some(b'\n') => 2,
                    Some(_) => 1,
                }
            } else {
                1
            };

            let raw: Vec<u8> = self.buffer.drain(..pos + terminator_len).collect();
            let line = String::from_utf8_lossy(&raw[..pos]);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() + self.data.len() > self.max_event_bytes {
            return Err(EventTooLarge {
                limit: self.max_event_bytes,
            });
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_owned()),
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_owned()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_owned()),
            data,
            id: self.last_event_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::new();
        chunks
            .iter()
            .flat_map(|c| decoder.feed(c).unwrap())
            .collect()
    }

    #[test]
    fn single_event() {
        let events = decode_all(&[b"data: {\"cargo\":{}}\n\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"cargo\":{}}");
        assert!(events[0].is_message());
    }

    #[test]
    fn multi_line_data_is_joined() {
        let events = decode_all(&[b"data: {\ndata: \"a\": 1\ndata: }\n\n"]);
        assert_eq!(events[0].data, "{\n\"a\": 1\n}");
    }

    #[test]
    fn event_split_across_chunks() {
        let events = decode_all(&[b"da", b"ta: hel", b"lo\n", b"\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn crlf_split_between_chunks() {
        let events = decode_all(&[b"data: x\r", b"\n\r", b"\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn bare_cr_line_endings() {
        let events = decode_all(&[b"data: a\rdata: b\r\rtrailing"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn utf8_split_across_chunks() {
        let text = "data: Dar es Salaam \u{2192} Lusaka\n\n".as_bytes();
        let (head, tail) = text.split_at(22);
        let events = decode_all(&[head, tail]);
        assert_eq!(events[0].data, "Dar es Salaam \u{2192} Lusaka");
    }

    #[test]
    fn comments_and_empty_frames_are_skipped() {
        let events = decode_all(&[b": keepalive\n\n\n: another\ndata: 1\n\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "1");
    }

    #[test]
    fn named_events_are_flagged() {
        let events = decode_all(&[b"event: ping\ndata: {}\n\ndata: {}\n\n"]);
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_message());
        assert_eq!(events[0].event, "ping");
        assert!(events[1].is_message());
    }

    #[test]
    fn id_persists_and_retry_is_ignored() {
        let events = decode_all(&[b"id: 42\nretry: 1500\ndata: a\n\ndata: b\n\n"]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id.as_deref(), Some("42"));
        assert_eq!(events[1].id.as_deref(), Some("42"));
        assert_eq!(events[1].data, "b");
    }

    #[test]
    fn unterminated_line_over_limit_is_refused() {
        let mut decoder = SseDecoder::with_limit(16);
        assert_eq!(decoder.feed(b"data: 0123456789").unwrap(), Vec::new());
        assert_eq!(
            decoder.feed(b"abcdef"),
            Err(EventTooLarge { limit: 16 })
        );
    }

    #[test]
    fn data_lines_count_towards_the_limit() {
        let mut decoder = SseDecoder::with_limit(16);
        assert!(decoder.feed(b"data: 12345678\n").is_ok());
        assert!(decoder.feed(b"data: 12345678\n").is_err());

        let mut roomy = SseDecoder::with_limit(16);
        let events = roomy.feed(b"data: 12345678\n\ndata: 12345678\n\n").unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn field_without_space_after_colon() {
        let events = decode_all(&[b"data:compact\n\n"]);
        assert_eq!(events[0].data, "compact");
    }

    #[test]
    fn incomplete_event_is_not_dispatched() {
        let events = decode_all(&[b"data: partial\n"]);
        assert!(events.is_empty());
    }
}
