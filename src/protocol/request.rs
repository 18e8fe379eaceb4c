//! Batch request construction.
//!
//! A batch is submitted as a single urlencoded POST. The query string
//! names the invoked functions and the session values; the `f.req` form
//! field carries one JSON array holding an inner array of 4-tuples
//! `[function id, payload JSON, null, execution tag]` - one tuple per
//! call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use super::session::SessionParams;
use crate::error::Result;

/// Execution tag used when a batch contains exactly one call.
pub const GENERIC_TAG: &str = "generic";

/// Default response-language query parameter (`hl`).
pub const RESPONSE_LANGUAGE: &str = "en";

/// Fixed protocol-mode query parameter (`rt`).
pub const PROTOCOL_MODE: &str = "c";

/// Increment applied to the request identifier on every mint.
pub const REQUEST_ID_STRIDE: u64 = 100_000;

/// Content type for batch request bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// One named function invocation with its JSON payload.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Opaque protocol-level function identifier.
    pub function_id: String,
    /// Arbitrary JSON payload forwarded to the function.
    pub payload: Value,
}

impl FunctionCall {
    /// Create a new function call.
    pub fn new(function_id: impl Into<String>, payload: Value) -> Self {
        Self {
            function_id: function_id.into(),
            payload,
        }
    }
}

impl<S: Into<String>> From<(S, Value)> for FunctionCall {
    fn from((function_id, payload): (S, Value)) -> Self {
        Self::new(function_id, payload)
    }
}

/// Monotonic request-identifier sequence.
///
/// Seeded with a random four-digit integer and advanced by
/// [`REQUEST_ID_STRIDE`] on every mint via an atomic fetch-add.
/// Identifiers are unique within a session with overwhelming
/// probability; they are never reused and never reset.
#[derive(Debug)]
pub struct RequestIdSequence {
    next: AtomicU64,
}

impl RequestIdSequence {
    /// Create a sequence seeded in [1000, 9999].
    pub fn new() -> Self {
        Self::with_seed(1000 + time_mixed_u64() % 9000)
    }

    /// Create a sequence starting at a fixed value.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    /// Mint the next request identifier.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(REQUEST_ID_STRIDE, Ordering::Relaxed)
    }
}

impl Default for RequestIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple random u64 mixed from system time and process ID.
fn time_mixed_u64() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let pid = std::process::id() as u64;
    nanos.wrapping_mul(0x517cc1b727220a95) ^ pid
}

/// Distinct function identifiers across a batch, first-occurrence order.
pub fn distinct_function_ids(calls: &[FunctionCall]) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for call in calls {
        if !ids.contains(&call.function_id.as_str()) {
            ids.push(call.function_id.as_str());
        }
    }
    ids
}

/// Execution order tag for the call at `index` in a batch of `batch_len`.
///
/// Single-call batches use the literal `"generic"`; larger batches use
/// ascending decimal tags starting at `"1"`.
pub fn execution_tag(index: usize, batch_len: usize) -> String {
    if batch_len == 1 {
        GENERIC_TAG.to_string()
    } else {
        (index + 1).to_string()
    }
}

/// Build the batch query string.
///
/// Carries the joined function identifiers (`rpcids`), the anti-forgery
/// token (`f.sid`), the backend identifier (`bl`), a freshly minted
/// request identifier (`_reqid`), the response language (`hl`) and the
/// protocol-mode constant (`rt`).
pub fn encode_query(
    params: &SessionParams,
    calls: &[FunctionCall],
    request_id: u64,
    language: &str,
) -> Result<String> {
    let rpcids = distinct_function_ids(calls).join(",");
    let request_id = request_id.to_string();

    let query = serde_urlencoded::to_string([
        ("rpcids", rpcids.as_str()),
        ("f.sid", params.csrf_token.as_str()),
        ("bl", params.backend.as_str()),
        ("_reqid", request_id.as_str()),
        ("hl", language),
        ("rt", PROTOCOL_MODE),
    ])?;
    Ok(query)
}

/// Build the urlencoded request body.
///
/// The `f.req` field holds one JSON array containing an inner array of
/// `[function id, payload JSON, null, execution tag]` tuples. The
/// user-scoped anti-forgery token is included as `at` only when present.
pub fn encode_form_body(calls: &[FunctionCall], user_csrf: Option<&str>) -> Result<String> {
    let mut tuples = Vec::with_capacity(calls.len());
    for (index, call) in calls.iter().enumerate() {
        let payload = serde_json::to_string(&call.payload)?;
        tuples.push(json!([
            call.function_id,
            payload,
            Value::Null,
            execution_tag(index, calls.len()),
        ]));
    }

    let f_req = serde_json::to_string(&json!([tuples]))?;

    let mut fields = vec![("f.req", f_req)];
    if let Some(at) = user_csrf {
        fields.push(("at", at.to_string()));
    }
    Ok(serde_urlencoded::to_string(&fields)?)
}

/// RPC endpoint path for an application, query string included.
pub fn endpoint_path(app_id: &str, query: &str) -> String {
    format!("/_/{app_id}/data/batchexecute?{query}")
}
