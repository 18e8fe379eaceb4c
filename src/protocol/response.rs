//! Response envelope parsing and result correlation.
//!
//! A batch response body opens with three newline-terminated lines of
//! framing noise, followed by JSON array envelopes separated by lines
//! holding a decimal length prefix. Only envelopes whose discriminator
//! equals `"wrb.fr"` carry results; all other envelopes are metadata and
//! are discarded. Result frames arrive in arbitrary order and are mapped
//! back to their calls purely by the echoed execution tag.

use serde_json::Value;

use super::request::{FunctionCall, GENERIC_TAG};
use crate::error::{BatchExecError, Result};

/// Discriminator marking an envelope as a result frame.
pub const RESULT_FRAME_MARKER: &str = "wrb.fr";

/// Newline-terminated framing lines preceding the envelope stream.
const FRAMING_LINES: usize = 3;

/// Envelope element holding the JSON-encoded return value.
const PAYLOAD_INDEX: usize = 2;

/// Envelope element holding the echoed execution tag.
const TAG_INDEX: usize = 6;

/// One decoded result frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultFrame {
    /// 0-based index of the call this frame answers.
    pub index: usize,
    /// Re-parsed return value.
    pub value: Value,
}

/// One correlated result: the originating call paired with its decoded
/// return value.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    /// Function identifier from the originating call.
    pub function_id: String,
    /// Payload from the originating call.
    pub payload: Value,
    /// 0-based position in the originating batch.
    pub index: usize,
    /// Decoded return value, or `None` when no frame matched this call.
    pub return_value: Option<Value>,
}

/// Parse a full response body into result frames.
///
/// # Errors
///
/// [`BatchExecError::Protocol`] if the framing preamble is truncated;
/// [`BatchExecError::Json`] if any envelope fails to parse. There is no
/// partial-success mode: one malformed envelope fails the whole batch.
pub fn parse_response(body: &str) -> Result<Vec<ResultFrame>> {
    let stream = skip_framing(body)?;

    let mut frames = Vec::new();
    for segment in split_envelopes(stream) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let envelope: Value = serde_json::from_str(segment)?;
        if let Some(frame) = decode_result_frame(&envelope)? {
            frames.push(frame);
        }
    }
    Ok(frames)
}

/// Zip a batch with its result frames, preserving input order.
///
/// Calls with no matching frame keep `return_value = None`; frames whose
/// index falls outside the batch are discarded with a warning.
pub fn correlate(calls: Vec<FunctionCall>, frames: Vec<ResultFrame>) -> Vec<CallResult> {
    let mut results: Vec<CallResult> = calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| CallResult {
            function_id: call.function_id,
            payload: call.payload,
            index,
            return_value: None,
        })
        .collect();

    for frame in frames {
        match results.get_mut(frame.index) {
            Some(slot) => slot.return_value = Some(frame.value),
            None => {
                tracing::warn!(index = frame.index, "discarding result frame with no matching call")
            }
        }
    }
    results
}

/// Slice off the framing preamble.
fn skip_framing(body: &str) -> Result<&str> {
    let mut rest = body;
    for _ in 0..FRAMING_LINES {
        let newline = rest.find('\n').ok_or_else(|| {
            BatchExecError::Protocol("response shorter than its framing preamble".to_string())
        })?;
        rest = &rest[newline + 1..];
    }
    Ok(rest)
}

/// Split the envelope stream on `\n<digits>\n` length-prefix lines.
///
/// The prefixed byte lengths are not validated; the separator pattern
/// alone delimits envelopes.
fn split_envelopes(stream: &str) -> Vec<&str> {
    let bytes = stream.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > i + 1 && j < bytes.len() && bytes[j] == b'\n' {
                segments.push(&stream[start..i]);
                start = j + 1;
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    segments.push(&stream[start..]);
    segments
}

/// Decode one envelope.
///
/// Returns `None` for metadata envelopes and for result frames whose
/// execution tag cannot be mapped to a call index.
fn decode_result_frame(envelope: &Value) -> Result<Option<ResultFrame>> {
    let entry = match envelope.get(0) {
        Some(entry) if entry.get(0).and_then(Value::as_str) == Some(RESULT_FRAME_MARKER) => entry,
        _ => return Ok(None),
    };

    let index = match entry
        .get(TAG_INDEX)
        .and_then(Value::as_str)
        .and_then(decode_tag)
    {
        Some(index) => index,
        None => {
            tracing::warn!(
                tag = ?entry.get(TAG_INDEX),
                "discarding result frame with undecodable execution tag"
            );
            return Ok(None);
        }
    };

    let value = match entry.get(PAYLOAD_INDEX) {
        Some(Value::String(raw)) => serde_json::from_str(raw)?,
        Some(Value::Null) | None => Value::Null,
        Some(other) => {
            return Err(BatchExecError::Protocol(format!(
                "result frame payload is neither a string nor null: {other}"
            )))
        }
    };

    Ok(Some(ResultFrame { index, value }))
}

/// Map an execution tag to its 0-based call index.
///
/// `"generic"` maps to 0; a decimal tag `"k"` maps to `k - 1`.
fn decode_tag(tag: &str) -> Option<usize> {
    if tag == GENERIC_TAG {
        Some(0)
    } else {
        tag.parse::<usize>().ok()?.checked_sub(1)
    }
}
