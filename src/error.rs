//! Error types for batchexec-client.

use thiserror::Error;

/// Transport-level failure: the request never produced a usable response.
///
/// Covers socket, TLS and timeout failures surfaced by the HTTP layer.
/// Transport errors are propagated to the caller immediately and never
/// retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying HTTP request failed (connect, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid UTF-8.
    #[error("response body is not valid UTF-8")]
    InvalidBody,
}

/// Session discovery failure.
///
/// Fatal to the engine instance: discovery runs once, its outcome is
/// memoized, and a failed outcome is returned unchanged to every later
/// call on the same instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Root page fetch returned a non-200 status.
    #[error("non-OK HTTP status code {0} from root page")]
    BadStatus(u16),

    /// No script block tagged with the parameter marker in the root page.
    #[error("parameter script marker not found in root page")]
    MarkerNotFound,

    /// The embedded parameter block did not parse as JSON or was missing
    /// a required field.
    #[error("malformed parameter block: {0}")]
    MalformedParams(String),

    /// Transport failed before a root page response was available.
    #[error("transport failure during discovery: {0}")]
    Transport(String),
}

/// Main error type for all batchexecute operations.
#[derive(Debug, Error)]
pub enum BatchExecError {
    /// Socket-level or timeout failure from the transport primitive.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session discovery failed; every call on this instance fails the
    /// same way.
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Batch endpoint returned a non-200 status. Fatal to this call only.
    #[error("batch request failed: non-OK HTTP status code {0}")]
    RequestFailed(u16),

    /// `execute` requires at least one function call.
    #[error("batch must contain at least one function call")]
    EmptyBatch,

    /// A response envelope failed to parse; the whole batch fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query string or form body could not be urlencoded.
    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// Response framing violation (e.g. truncated preamble).
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using BatchExecError.
pub type Result<T> = std::result::Result<T, BatchExecError>;
