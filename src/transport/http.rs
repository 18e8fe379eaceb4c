//! HTTP transport over reqwest.
//!
//! One request in, one fully buffered response out. Redirects are not
//! followed and nothing is retried; connection and timeout failures
//! surface as [`TransportError`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::header::SET_COOKIE;

use super::{parse_set_cookie, Method, Transport, TransportRequest, TransportResponse};
use crate::error::TransportError;

/// Client-level timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Transport`] implementation backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default timeout and redirects disabled.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to create HTTP client");
        Self { client }
    }

    /// Create a transport from a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn fetch(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        async move {
            let url = request.url();
            tracing::debug!(method = request.method.as_str(), %url, "issuing request");

            let mut builder = match request.method {
                Method::Get => self.client.get(url.as_str()),
                Method::Post => self.client.post(url.as_str()),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();

            let mut headers = HashMap::new();
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    headers.insert(name.as_str().to_string(), value.to_string());
                }
            }
            let cookies = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(parse_set_cookie)
                .collect();

            let body = response.bytes().await?;

            Ok(TransportResponse {
                status,
                headers,
                body,
                cookies,
            })
        }
    }
}
