use serde_json::Value;

/// Payload that terminates a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Normalized meaning of one SSE `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    /// Text to append to the response; may be empty (no-op).
    Delta(String),
    /// The stream is over; anything after this is ignored.
    Done,
}

/// Map one frame payload onto a text delta.
///
/// Shapes are checked in priority order:
/// 1) a non-empty string `response` field
/// 2) `choices[0].delta.content`
///
/// Empty payloads are keep-alives and yield an empty delta without parsing.
/// A JSON error is returned to the caller, which is expected to log it and
/// keep reading.
pub fn extract_delta(payload: &str) -> Result<StreamSignal, serde_json::Error> {
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Ok(StreamSignal::Done);
    }
    if payload.is_empty() {
        return Ok(StreamSignal::Delta(String::new()));
    }

    let value = serde_json::from_str::<Value>(payload)?;
    let delta = response_field(&value)
        .or_else(|| choice_text(&value, "delta"))
        .unwrap_or_default();
    Ok(StreamSignal::Delta(delta.to_owned()))
}

/// Extract the full reply text from a non-streaming JSON body.
///
/// Accepts `{"response": ...}`, the OpenAI completion shape
/// `choices[0].message.content`, and the streaming delta shape.
pub fn extract_completion(body: &str) -> Result<String, serde_json::Error> {
    let value = serde_json::from_str::<Value>(body.trim())?;
    let text = response_field(&value)
        .or_else(|| choice_text(&value, "message"))
        .or_else(|| choice_text(&value, "delta"))
        .unwrap_or_default();
    Ok(text.to_owned())
}

fn response_field(value: &Value) -> Option<&str> {
    value
        .get("response")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

fn choice_text<'a>(value: &'a Value, container: &str) -> Option<&'a str> {
    value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get(container))
        .and_then(|inner| inner.get("content"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
