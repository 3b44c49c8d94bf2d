/// Splits an SSE byte stream into `data:` payloads.
///
/// Bytes are buffered until a newline arrives, so lines and multi-byte
/// characters may be cut anywhere by the transport.
#[derive(Debug, Default)]
pub struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the payloads of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let Some(last_newline) = self.pending.iter().rposition(|byte| *byte == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        complete.split(|byte| *byte == b'\n').filter_map(payload).collect()
    }

    /// Drains the held-back tail once the transport has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let tail = std::mem::take(&mut self.pending);
        payload(&tail).into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let data = line.trim_end().strip_prefix("data:")?.trim_start();
    (!data.is_empty()).then(|| data.to_string())
}
