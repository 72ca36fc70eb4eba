use std::collections::VecDeque;
use std::fmt;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};

use crate::config::ChatApiConfig;
use crate::delta::{extract_completion, extract_delta, StreamSignal};
use crate::error::{parse_error_message, ChatApiError};
use crate::headers::{build_headers, is_event_stream};
use crate::payload::ChatRequest;
use crate::sse::SseFrameDecoder;
use crate::url::normalize_chat_url;

/// Raw response body chunks in arrival order.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ChatApiError>>;

/// Successful response, classified by body mode.
pub enum ChatResponse {
    /// Single JSON body, consumed whole.
    Complete(String),
    /// SSE body still being received.
    Stream(ByteStream),
}

impl ChatResponse {
    /// Wrap an already-buffered SSE body as a one-chunk stream.
    pub fn buffered_stream(body: impl Into<Vec<u8>>) -> Self {
        let chunk: Result<Vec<u8>, ChatApiError> = Ok(body.into());
        Self::Stream(stream::iter(vec![chunk]).boxed())
    }
}

impl fmt::Debug for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(body) => f.debug_tuple("Complete").field(body).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ChatApiError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    ChatApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        let endpoint = self.normalized_endpoint();
        let url = Url::parse(&endpoint)
            .map_err(|error| ChatApiError::InvalidBaseUrl(format!("{endpoint}: {error}")))?;
        let headers = self.build_headers()?;
        Ok(self.http.post(url).headers(headers).json(request))
    }

    /// Issue one chat request and classify the response body.
    ///
    /// Non-2xx statuses and bodiless responses are errors; no retry is made.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatApiError> {
        tracing::debug!(
            messages = request.messages.len(),
            endpoint = %self.normalized_endpoint(),
            "sending chat request"
        );
        let response = self.build_request(request)?.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(status, &body);
            tracing::warn!(%status, %message, "chat request rejected");
            return Err(ChatApiError::Status(status, message));
        }
        if status == StatusCode::NO_CONTENT {
            return Err(ChatApiError::MissingBody(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if is_event_stream(content_type.as_deref()) {
            let body = response.bytes_stream().map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(ChatApiError::from)
            });
            return Ok(ChatResponse::Stream(body.boxed()));
        }

        let body = response.text().await?;
        if looks_like_event_stream(&body) {
            return Ok(ChatResponse::buffered_stream(body));
        }
        Ok(ChatResponse::Complete(body))
    }

    /// Send a request and feed every non-empty delta to `on_delta`.
    ///
    /// Returns the accumulated reply text.
    pub async fn stream_with_handler<F>(
        &self,
        request: &ChatRequest,
        mut on_delta: F,
    ) -> Result<String, ChatApiError>
    where
        F: FnMut(&str),
    {
        let mut text = String::new();
        match self.send(request).await? {
            ChatResponse::Complete(body) => {
                let reply = extract_completion(&body)
                    .map_err(|error| ChatApiError::MalformedBody(error.to_string()))?;
                if !reply.is_empty() {
                    on_delta(&reply);
                    text = reply;
                }
            }
            ChatResponse::Stream(body) => {
                let mut reader = DeltaReader::new(body);
                while let Some(delta) = reader.next_delta().await {
                    let delta = delta?;
                    text.push_str(&delta);
                    on_delta(&delta);
                }
            }
        }
        Ok(text)
    }
}

/// Pulls normalized text deltas out of an SSE byte stream.
///
/// Each read's frames are fully drained before the next read is issued.
/// Reading stops at `[DONE]` (bytes after it are ignored) or at the end of the
/// transport stream, after a final flush of the decoder.
pub struct DeltaReader {
    body: ByteStream,
    decoder: SseFrameDecoder,
    pending: VecDeque<String>,
    finished: bool,
    saw_done: bool,
    malformed_frames: usize,
}

impl DeltaReader {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: SseFrameDecoder::default(),
            pending: VecDeque::new(),
            finished: false,
            saw_done: false,
            malformed_frames: 0,
        }
    }

    /// Next non-empty delta, `None` once the stream is over.
    ///
    /// A transport error is yielded once and ends the reader.
    pub async fn next_delta(&mut self) -> Option<Result<String, ChatApiError>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                match extract_delta(&frame) {
                    Ok(StreamSignal::Done) => {
                        self.saw_done = true;
                        self.finished = true;
                        self.pending.clear();
                        return None;
                    }
                    Ok(StreamSignal::Delta(delta)) if !delta.is_empty() => {
                        return Some(Ok(delta));
                    }
                    Ok(StreamSignal::Delta(_)) => continue,
                    Err(error) => {
                        self.malformed_frames += 1;
                        tracing::warn!(%error, payload = %frame, "skipping malformed SSE frame");
                        continue;
                    }
                }
            }

            if self.finished {
                return None;
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Some(Err(error)) => {
                    self.finished = true;
                    return Some(Err(error));
                }
                None => {
                    self.finished = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    /// Whether the `[DONE]` sentinel ended the stream.
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    /// Number of frames skipped because their payload was not valid JSON.
    pub fn malformed_frames(&self) -> usize {
        self.malformed_frames
    }
}

/// SSE sent without its content type: the first line is a field or comment.
fn looks_like_event_stream(body: &str) -> bool {
    let first_line = body.trim_start().lines().next().unwrap_or("");
    ["data:", "event:", "id:", "retry:", ":"]
        .iter()
        .any(|prefix| first_line.starts_with(prefix))
}
