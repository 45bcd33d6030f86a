use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field prefix that marks a significant line.
pub const RECORD_PREFIX: &str = "data: ";

/// Record type the service uses for content-bearing records.
pub const RESULT_RECORD_TYPE: &str = "result";

const DONE_SENTINEL: &str = "[DONE]";

/// One decoded significant line: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl StreamRecord {
    pub fn result(data: Value) -> Self {
        Self {
            kind: Some(RESULT_RECORD_TYPE.to_owned()),
            data: Some(data),
        }
    }

    pub fn is_result(&self) -> bool {
        self.kind.as_deref() == Some(RESULT_RECORD_TYPE)
    }
}

/// Incremental newline splitter over raw bytes.
///
/// Multi-byte UTF-8 sequences cut by a chunk boundary are held back until the
/// rest arrives, so the emitted lines never depend on where chunks were split.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    buffer: String,
}

impl LineBuffer {
    /// Feed arbitrary bytes and drain every complete line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        self.decode_pending();

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let fragment = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, fragment);
        complete.lines().map(ToOwned::to_owned).collect()
    }

    /// Flush the trailing fragment once the transport has closed.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            self.buffer
                .push_str(&String::from_utf8_lossy(&std::mem::take(&mut self.pending)));
        }

        let fragment = std::mem::take(&mut self.buffer);
        let fragment = fragment.strip_suffix('\r').unwrap_or(&fragment);
        if fragment.is_empty() {
            None
        } else {
            Some(fragment.to_owned())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.buffer.is_empty()
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        self.buffer.push_str(text);
                    }
                    match error.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
    }
}

/// Incremental decoder from raw response bytes to [`StreamRecord`]s.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    lines: LineBuffer,
    malformed: usize,
}

impl FrameDecoder {
    /// Feed arbitrary bytes into the decoder and drain complete records.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamRecord> {
        let lines = self.lines.push(bytes);
        self.decode_lines(lines)
    }

    /// Decode whatever remains once the transport has closed.
    pub fn finish(&mut self) -> Vec<StreamRecord> {
        let lines: Vec<String> = self.lines.finish().into_iter().collect();
        self.decode_lines(lines)
    }

    /// Decode a complete payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<StreamRecord> {
        let mut decoder = Self::default();
        let mut records = decoder.feed(input.as_bytes());
        records.extend(decoder.finish());
        records
    }

    /// Number of significant lines dropped because their JSON did not parse.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.lines.is_empty()
    }

    fn decode_lines(&mut self, lines: Vec<String>) -> Vec<StreamRecord> {
        let mut records = Vec::new();
        for line in lines {
            match decode_line(&line) {
                Some(Ok(record)) => records.push(record),
                Some(Err(error)) => {
                    self.malformed += 1;
                    warn!("dropping malformed stream record: {error}; line: {line}");
                }
                None => {}
            }
        }
        records
    }
}

/// Decode one line.
///
/// Returns `None` for lines that are not significant, including an empty
/// payload and the `[DONE]` sentinel.
pub fn decode_line(line: &str) -> Option<Result<StreamRecord, serde_json::Error>> {
    let payload = line.strip_prefix(RECORD_PREFIX)?.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        debug!("skipping empty stream record");
        return None;
    }
    Some(serde_json::from_str(payload))
}
