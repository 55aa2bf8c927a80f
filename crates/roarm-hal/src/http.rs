//! [`HttpTransport`] – the arm's JSON-over-HTTP endpoint.
//!
//! The firmware serves `GET http://<host>/js?json=<command>` and answers
//! with a JSON object (feedback/info commands) or an empty body.

use std::time::Duration;

use roarm_types::RoarmError;

use crate::transport::{validate_payload, MotionTransport};

/// Blocking HTTP client bound to one arm address.
pub struct HttpTransport {
    address: String,
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport for `address` (a host or `host:port`, with or
    /// without an `http://` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`RoarmError::Config`] when the address is empty or the HTTP
    /// client cannot be built.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, RoarmError> {
        let host = address
            .trim()
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        if host.is_empty() {
            return Err(RoarmError::Config(
                "no robot address configured (set ROARM_HOST or pass --address)".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RoarmError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: endpoint_url(&host),
            address: host,
            client,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

fn endpoint_url(host: &str) -> String {
    format!("http://{host}/js")
}

impl MotionTransport for HttpTransport {
    fn exchange(&self, payload: &str) -> Result<String, RoarmError> {
        validate_payload(payload)?;

        let response = self
            .client
            .get(&self.url)
            .query(&[("json", payload)])
            .send()
            .map_err(|e| RoarmError::Unreachable {
                address: self.address.clone(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoarmError::Rejected(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| RoarmError::MalformedReply(format!("failed to read body: {e}")))
    }

    fn describe(&self) -> String {
        format!("http@{}", self.address)
    }
}
