//! Protocol engine - session discovery, batch encoding, envelope decoding.
//!
//! This module implements the batchexecute wire protocol:
//! - session-parameter extraction from the application root page
//! - batched request construction (query string + `f.req` form body)
//! - response envelope parsing and correlation of out-of-order results

mod request;
mod response;
mod session;

pub use request::{
    distinct_function_ids, encode_form_body, encode_query, endpoint_path, execution_tag,
    FunctionCall, RequestIdSequence, FORM_CONTENT_TYPE, GENERIC_TAG, PROTOCOL_MODE,
    REQUEST_ID_STRIDE, RESPONSE_LANGUAGE,
};
pub use response::{correlate, parse_response, CallResult, ResultFrame, RESULT_FRAME_MARKER};
pub use session::{extract_session_params, SessionParams, PARAMETER_MARKER};
