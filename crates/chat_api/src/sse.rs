/// Frames and leftover text produced by one decode step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrames {
    /// `data:` payloads of every complete frame, in stream order.
    pub frames: Vec<String>,
    /// Text after the last frame delimiter; must prefix the next decode input.
    pub remainder: String,
}

/// Split `previous + chunk` into complete SSE frames.
///
/// `\r\n` is normalized to `\n` before splitting on blank lines. Frames without
/// any `data:` line are dropped. A trailing lone `\r` stays in the remainder so
/// a `\r\n` pair split across chunks still normalizes.
pub fn split_frames(previous: &str, chunk: &str) -> DecodedFrames {
    let mut joined = String::with_capacity(previous.len() + chunk.len());
    joined.push_str(previous);
    joined.push_str(chunk);
    let normalized = joined.replace("\r\n", "\n");

    let mut frames = Vec::new();
    let mut rest = normalized.as_str();
    while let Some(split) = rest.find("\n\n") {
        if let Some(payload) = extract_data_payload(&rest[..split]) {
            frames.push(payload);
        }
        rest = &rest[split + 2..];
    }

    DecodedFrames {
        frames,
        remainder: rest.to_owned(),
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .split('\n')
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

/// Streaming UTF-8 decoder that carries incomplete code points across chunks.
#[derive(Debug, Default)]
struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Incremental parser for SSE byte streams.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    text: Utf8StreamDecoder,
    buffer: String,
}

impl SseFrameDecoder {
    /// Feed arbitrary bytes into the decoder and drain complete frame payloads.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.text.decode(bytes);
        let decoded = split_frames(&self.buffer, &text);
        self.buffer = decoded.remainder;
        decoded.frames
    }

    /// Flush at end of input by appending a synthetic frame delimiter.
    pub fn finish(&mut self) -> Vec<String> {
        let mut tail = self.text.finish();
        tail.push_str("\n\n");
        let previous = std::mem::take(&mut self.buffer);
        let decoded = split_frames(&previous, &tail);
        self.buffer = decoded.remainder;
        decoded.frames
    }

    /// Parse a complete SSE body in one shot, including the end-of-input flush.
    pub fn parse_frames(input: &str) -> Vec<String> {
        let mut decoder = Self::default();
        let mut frames = decoder.feed(input.as_bytes());
        frames.extend(decoder.finish());
        frames
    }

    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty() && self.text.pending.is_empty()
    }
}
