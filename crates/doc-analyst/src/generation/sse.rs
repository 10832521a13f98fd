//! Incremental Server-Sent Events decoder
//!
//! Network chunks do not respect line or UTF-8 boundaries, so bytes are
//! buffered until a full line is available.

/// Payload marking the end of an OpenAI-style stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// A complete SSE event relevant to chat streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Joined `data:` lines of one event
    Data(String),
    /// `data: [DONE]`
    Done,
}

/// Turns arbitrary byte chunks into complete frames
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes after the last newline seen
    pending: Vec<u8>,
    /// `data:` lines of the event being assembled
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush whatever is left once the body has ended
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&rest);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        if let Some(frame) = self.dispatch() {
            frames.push(frame);
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        // Comment lines (keep-alives)
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        // `event`, `id` and `retry` carry nothing for chat completions
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.data_lines.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data_lines).join("\n");
        if data.trim() == DONE_SENTINEL {
            Some(SseFrame::Done)
        } else {
            Some(SseFrame::Data(data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_events() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: {\"a\":1}\n\ndata: {\"a\":2}\n\ndata: [DONE]\n\n");
        assert_eq!(
            frames,
            vec![
                SseFrame::Data("{\"a\":1}".to_string()),
                SseFrame::Data("{\"a\":2}".to_string()),
                SseFrame::Done,
            ]
        );
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: {\"x\"").is_empty());
        assert!(decoder.push(b":true}\n").is_empty());
        assert_eq!(
            decoder.push(b"\n"),
            vec![SseFrame::Data("{\"x\":true}".to_string())]
        );
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: café\n\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = bytes.len() - 3;
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(
            decoder.push(&bytes[split..]),
            vec![SseFrame::Data("café".to_string())]
        );
    }

    #[test]
    fn test_crlf_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\r\nevent: message\r\nid: 7\r\ndata: hi\r\n\r\n");
        assert_eq!(frames, vec![SseFrame::Data("hi".to_string())]);
    }

    #[test]
    fn test_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: line one\ndata: line two\n\n");
        assert_eq!(frames, vec![SseFrame::Data("line one\nline two".to_string())]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec![SseFrame::Data("tail".to_string())]);
        assert!(decoder.finish().is_empty());
    }
}
