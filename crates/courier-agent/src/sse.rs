//! Incremental SSE parser for provider response bodies.
//!
//! A push parser: feed it byte chunks as they arrive, collect the
//! frames that complete. Handles CRLF, multi-line `data:` fields, and
//! frames cut across chunk boundaries.

/// A parsed SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
}

#[derive(Default)]
pub struct SseParser {
    line_buf: String,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte chunk, returning any frames it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for c in String::from_utf8_lossy(bytes).chars() {
            if c != '\n' {
                self.line_buf.push(c);
                continue;
            }
            let line = std::mem::take(&mut self.line_buf);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.take_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes any partially accumulated frame at end of stream.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.line_buf.is_empty() {
            let line = std::mem::take(&mut self.line_buf);
            if let Some(frame) = self.take_line(&line) {
                return Some(frame);
            }
        }
        if self.data_lines.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        })
    }

    fn take_line(&mut self, line: &str) -> Option<SseFrame> {
        // Blank line terminates a frame.
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            return Some(SseFrame {
                event: self.event.take(),
                data: std::mem::take(&mut self.data_lines).join("\n"),
            });
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            // A line with no colon is a field with an empty value.
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            // id, retry, and comments (empty field) are ignored.
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: hello\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "hello");
        assert_eq!(frames[0].event, None);
    }

    #[test]
    fn frame_with_event_type() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: message\ndata: {\"a\":1}\n\n");
        assert_eq!(frames[0].event.as_deref(), Some("message"));
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: hel").is_empty());
        assert!(parser.push(b"lo wor").is_empty());
        let frames = parser.push(b"ld\n\n");
        assert_eq!(frames[0].data, "hello world");
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: one\ndata: two\n\n");
        assert_eq!(frames[0].data, "one\ntwo");
    }

    #[test]
    fn crlf_and_comments() {
        let mut parser = SseParser::new();
        let frames = parser.push(b": keep-alive\r\ndata: x\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: a\n\ndata: b\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].data, "b");
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: tail").is_empty());
        let frame = parser.finish().unwrap();
        assert_eq!(frame.data, "tail");
        assert!(parser.finish().is_none());
    }
}
