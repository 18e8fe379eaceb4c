//! Batch execution engine.
//!
//! [`BatchClient`] owns one target application: it discovers session
//! parameters lazily (once, shared by every caller on the instance),
//! mints request identifiers and drives batch calls through the
//! transport primitive. Construction performs no network I/O; the first
//! call suspends on discovery.
//!
//! # Example
//!
//! ```ignore
//! use batchexec_client::BatchClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchClient::new("translate.google.com");
//!     let value = client
//!         .execute_one("jQ1olc", json!(["hello", "en", null]))
//!         .await?;
//!     println!("{value:?}");
//!     Ok(())
//! }
//! ```

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::{BatchExecError, DiscoveryError, Result};
use crate::protocol::{
    correlate, encode_form_body, encode_query, endpoint_path, extract_session_params,
    parse_response, CallResult, FunctionCall, RequestIdSequence, SessionParams, FORM_CONTENT_TYPE,
    RESPONSE_LANGUAGE,
};
use crate::transport::{HttpTransport, Transport, TransportRequest};

/// Builder for configuring and creating a [`BatchClient`].
///
/// Use the fluent API to override the response language or swap the
/// transport, then call `build()`.
pub struct BatchClientBuilder<T = HttpTransport> {
    hostname: String,
    language: String,
    transport: T,
}

impl BatchClientBuilder<HttpTransport> {
    /// Create a builder targeting `hostname` with the default transport.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            language: RESPONSE_LANGUAGE.to_string(),
            transport: HttpTransport::new(),
        }
    }
}

impl<T: Transport> BatchClientBuilder<T> {
    /// Set the response language tag (`hl` query parameter). Default: `en`.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Replace the transport primitive.
    pub fn transport<U: Transport>(self, transport: U) -> BatchClientBuilder<U> {
        BatchClientBuilder {
            hostname: self.hostname,
            language: self.language,
            transport,
        }
    }

    /// Build the client. No network I/O happens here; discovery runs
    /// lazily on the first call.
    pub fn build(self) -> BatchClient<T> {
        BatchClient {
            hostname: self.hostname,
            language: self.language,
            transport: self.transport,
            request_ids: RequestIdSequence::new(),
            session: OnceCell::new(),
        }
    }
}

/// Batch execution engine for one target application.
///
/// Each instance exclusively owns its session parameters and its
/// request-identifier counter; nothing is shared across instances.
pub struct BatchClient<T = HttpTransport> {
    hostname: String,
    language: String,
    transport: T,
    request_ids: RequestIdSequence,
    session: OnceCell<std::result::Result<SessionParams, DiscoveryError>>,
}

impl BatchClient<HttpTransport> {
    /// Create a client targeting `hostname` with the default transport.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::builder(hostname).build()
    }

    /// Create a builder for custom configuration.
    pub fn builder(hostname: impl Into<String>) -> BatchClientBuilder<HttpTransport> {
        BatchClientBuilder::new(hostname)
    }
}

impl<T: Transport> BatchClient<T> {
    /// Execute a batch of function calls.
    ///
    /// Returns one [`CallResult`] per call, in input order, with
    /// `return_value = None` for calls the server sent no frame for.
    ///
    /// # Errors
    ///
    /// [`BatchExecError::EmptyBatch`] for an empty batch;
    /// [`BatchExecError::Discovery`] when session discovery failed (also
    /// on every later call); [`BatchExecError::RequestFailed`] on a
    /// non-200 batch response (fatal to this call only); transport and
    /// envelope-parse failures per [`crate::error`].
    pub async fn execute(&self, calls: Vec<FunctionCall>) -> Result<Vec<CallResult>> {
        if calls.is_empty() {
            return Err(BatchExecError::EmptyBatch);
        }

        let session = self.session().await?;

        let request_id = self.request_ids.next_id();
        let query = encode_query(session, &calls, request_id, &self.language)?;
        let body = encode_form_body(&calls, session.user_csrf.as_deref())?;
        let path = endpoint_path(&session.app_id, &query);

        tracing::debug!(request_id, calls = calls.len(), "executing batch");

        let request = TransportRequest::post(&self.hostname, path)
            .header("content-type", FORM_CONTENT_TYPE)
            .body(body);
        let response = self.transport.fetch(request).await?;

        if response.status != 200 {
            return Err(BatchExecError::RequestFailed(response.status));
        }

        let frames = parse_response(response.text()?)?;
        Ok(correlate(calls, frames))
    }

    /// Execute a single function call and return its matched value.
    ///
    /// Returns `None` when the response contained no frame for the call.
    pub async fn execute_one(
        &self,
        function_id: impl Into<String>,
        payload: Value,
    ) -> Result<Option<Value>> {
        let mut results = self
            .execute(vec![FunctionCall::new(function_id, payload)])
            .await?;
        Ok(results.swap_remove(0).return_value)
    }

    /// Session parameters, running discovery at most once.
    ///
    /// Concurrent callers issued before discovery completes all await the
    /// same in-flight discovery. The outcome is terminal: a failed
    /// discovery is returned unchanged to every later call.
    async fn session(&self) -> Result<&SessionParams> {
        let outcome = self.session.get_or_init(|| self.discover()).await;
        match outcome {
            Ok(params) => Ok(params),
            Err(e) => Err(BatchExecError::Discovery(e.clone())),
        }
    }

    /// Fetch the root page and extract session parameters.
    async fn discover(&self) -> std::result::Result<SessionParams, DiscoveryError> {
        tracing::debug!(host = %self.hostname, "discovering session parameters");

        let response = self
            .transport
            .fetch(TransportRequest::get(&self.hostname, "/"))
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;

        if response.status != 200 {
            return Err(DiscoveryError::BadStatus(response.status));
        }

        let page = response
            .text()
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;
        let params = extract_session_params(page)?;

        tracing::debug!(app_id = %params.app_id, backend = %params.backend, "session parameters discovered");
        Ok(params)
    }
}
