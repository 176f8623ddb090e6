//! Line framing for server-sent event streams.
//!
//! Both vendors stream `data: <json>` lines. Network chunks can end
//! anywhere, including in the middle of a UTF-8 sequence, so bytes are
//! buffered until a full line is available.

/// Accumulates raw stream bytes and hands out complete `data:` payloads.
#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Pop the next `data:` payload, skipping blank lines, comments and
    /// other fields (`event:`, `id:`). Returns `None` until a full line
    /// has been buffered.
    pub(crate) fn next_data(&mut self) -> Option<String> {
        while let Some(newline_pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline_pos).collect();
            if let Some(data) = data_payload(&line) {
                return Some(data);
            }
        }
        None
    }

    /// Payload of a trailing line that was never newline-terminated.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.pending);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data).to_string())
}
