//! Server-sent events decoding for streamed chat completions.
//!
//! Bytes arrive in arbitrary network chunks; the decoder buffers partial
//! lines and yields the payload of every complete `data:` field.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the `data:` payloads completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(&['\n', '\r'][..]);

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        payloads
    }
}

pub const DONE_MARKER: &str = "[DONE]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_events() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"a\":1}\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}", DONE_MARKER]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"con").is_empty());
        assert!(decoder.feed("tent\":\"hé".as_bytes()).is_empty());
        assert_eq!(decoder.feed(b"\"}\r\n\r\n"), vec!["{\"content\":\"hé\"}"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: é\n".as_bytes();
        assert!(decoder.feed(&bytes[..7]).is_empty());
        assert_eq!(decoder.feed(&bytes[7..]), vec!["é"]);
    }

    #[test]
    fn test_ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b": keep-alive\nevent: message\nid: 7\ndata:x\n\n");
        assert_eq!(payloads, vec!["x"]);
    }
}
