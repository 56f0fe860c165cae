use serde_json::Value;
use tracing::warn;

/// Incremental decoder for the completion API's SSE stream.
///
/// Body chunks arrive with no alignment to event boundaries, so a carry
/// buffer holds any trailing partial line until the next chunk completes it.
/// Event lines are `data: <json>`; the literal `[DONE]` sentinel ends the
/// stream and is never parsed as JSON. Malformed lines are logged and
/// skipped, never fatal.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    carry: String,
    done: bool,
}

impl SseDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one body chunk, returning the content deltas it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }

        self.carry.push_str(&String::from_utf8_lossy(chunk));

        while let Some(newline) = self.carry.find('\n') {
            let line: String = self.carry.drain(..=newline).collect();
            if self.handle_line(line.trim(), &mut deltas) {
                self.done = true;
                break;
            }
        }

        deltas
    }

    /// Process one complete line; returns true on the terminal sentinel.
    fn handle_line(&self, line: &str, deltas: &mut Vec<String>) -> bool {
        let Some(data) = line.strip_prefix("data: ") else {
            return false;
        };
        let data = data.trim();

        if data == "[DONE]" {
            return true;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(frame) => {
                if let Some(content) = frame["choices"][0]["delta"]["content"].as_str() {
                    if !content.is_empty() {
                        deltas.push(content.to_string());
                    }
                }
            }
            Err(e) => {
                warn!("skipping malformed SSE frame: {}", e);
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\n",
            content
        )
    }

    #[test]
    fn test_decodes_content_frames() {
        let mut decoder = SseDecoder::new();
        let deltas = decoder.push(format!("{}{}", frame("Hel"), frame("lo")).as_bytes());
        assert_eq!(deltas, vec!["Hel", "lo"]);
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let full = frame("Hello");
        let (a, b) = full.split_at(17);

        assert!(decoder.push(a.as_bytes()).is_empty());
        assert_eq!(decoder.push(b.as_bytes()), vec!["Hello"]);
    }

    #[test]
    fn test_done_sentinel_stops_decoding() {
        let mut decoder = SseDecoder::new();
        let input = format!("{}data: [DONE]\n{}", frame("Hi"), frame("ignored"));

        let deltas = decoder.push(input.as_bytes());
        assert_eq!(deltas, vec!["Hi"]);
        assert!(decoder.is_done());
        assert!(decoder.push(frame("late").as_bytes()).is_empty());
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let mut decoder = SseDecoder::new();
        let input = format!("data: {{not json\n{}", frame("ok"));

        let deltas = decoder.push(input.as_bytes());
        assert_eq!(deltas, vec!["ok"]);
    }

    #[test]
    fn test_non_event_lines_are_ignored() {
        let mut decoder = SseDecoder::new();
        let input = format!(": keep-alive\n\n{}", frame("ok"));

        let deltas = decoder.push(input.as_bytes());
        assert_eq!(deltas, vec!["ok"]);
    }

    #[test]
    fn test_empty_delta_is_dropped() {
        let mut decoder = SseDecoder::new();
        let deltas = decoder.push(frame("").as_bytes());
        assert!(deltas.is_empty());
    }
}
