use serde::Deserialize;

/// One line of a streaming `/api/generate` reply.
#[derive(Debug, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reassembles newline-delimited JSON from arbitrary body chunks.
///
/// Splitting happens on raw bytes: `\n` never occurs inside a multi-byte
/// UTF-8 sequence, so a character cut across two chunks stays intact.
#[derive(Debug, Default)]
pub struct NdjsonLines {
    pending: Vec<u8>,
}

impl NdjsonLines {
    /// Feed a chunk; returns every line it completed, blank lines dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if !line.trim_ascii().is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.pending);
        (!rest.trim_ascii().is_empty()).then_some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_chunks() {
        let mut lines = NdjsonLines::default();
        assert!(lines.push(br#"{"response":"he"#).is_empty());
        let done = lines.push(b"l\"}\n{\"response\":\"lo\"}\n{\"do");
        assert_eq!(done, vec![br#"{"response":"hel"}"#.to_vec(), br#"{"response":"lo"}"#.to_vec()]);
        assert_eq!(lines.finish(), Some(br#"{"do"#.to_vec()));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn multibyte_characters_survive_chunk_boundaries() {
        let line = "{\"response\":\"😊\"}\n".as_bytes();
        let (head, tail) = line.split_at(15);
        let mut lines = NdjsonLines::default();
        assert!(lines.push(head).is_empty());
        let done = lines.push(tail);
        let chunk: GenerateChunk = serde_json::from_slice(&done[0]).unwrap();
        assert_eq!(chunk.response, "😊");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut lines = NdjsonLines::default();
        let done = lines.push(b"\n\r\n{\"done\":true}\r\n");
        assert_eq!(done.len(), 1);
        let chunk: GenerateChunk = serde_json::from_slice(&done[0]).unwrap();
        assert!(chunk.done);
        assert!(lines.finish().is_none());
    }
}
