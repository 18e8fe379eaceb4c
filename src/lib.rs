//! # batchexec-client
//!
//! Rust client for the `batchexecute` remote-procedure-call protocol
//! used by a family of web applications to batch multiple named function
//! invocations into one HTTP round trip and receive their results as a
//! single interleaved response stream.
//!
//! ## Architecture
//!
//! - **Transport Primitive** ([`transport`]): one HTTP request in, one
//!   fully buffered response out (status, headers, body, cookies). No
//!   protocol knowledge.
//! - **Protocol Engine** ([`BatchClient`] + [`protocol`]): lazy one-time
//!   session discovery against the target host, batch envelope
//!   construction, response envelope parsing, and correlation of
//!   out-of-order results back to their originating calls.
//!
//! ## Example
//!
//! ```ignore
//! use batchexec_client::{BatchClient, FunctionCall};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchClient::new("translate.google.com");
//!     let results = client
//!         .execute(vec![
//!             FunctionCall::new("jQ1olc", json!(["hello", "en", null])),
//!             FunctionCall::new("jQ1olc", json!(["world", "en", null])),
//!         ])
//!         .await?;
//!     for result in results {
//!         println!("{}: {:?}", result.function_id, result.return_value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod transport;

mod client;

pub use client::{BatchClient, BatchClientBuilder};
pub use error::{BatchExecError, DiscoveryError, Result, TransportError};
pub use protocol::{CallResult, FunctionCall, SessionParams};
