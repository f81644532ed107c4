//! HTTP transport seam.
//!
//! Adapters talk to providers through `HttpTransport` so tests can swap in
//! stubs and call-count spies. `ReqwestTransport` is the production
//! implementation over a blocking `reqwest` client; every request carries its
//! own timeout and is aborted when it elapses.

use crate::error::TransportError;
use std::time::Duration;

pub const USER_AGENT: &str = "MarketLens/0.1 (+housing-market-data)";

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: Option<&str>) -> Self {
        match token {
            Some(t) if !t.is_empty() => self.header("Authorization", format!("Bearer {t}")),
            _ => self,
        }
    }
}

pub trait HttpTransport: Send + Sync {
    /// Issue a GET and decode the body as JSON. Non-2xx is an error.
    fn get_json(&self, request: &HttpRequest) -> Result<serde_json::Value, TransportError>;

    /// Issue a HEAD and return the status code (any status, including 4xx/5xx).
    fn head(&self, url: &str, timeout: Duration) -> Result<u16, TransportError>;
}

/// Blocking `reqwest` transport.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn map_send_error(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get_json(&self, request: &HttpRequest) -> Result<serde_json::Value, TransportError> {
        tracing::debug!(url = %request.url, timeout_ms = request.timeout.as_millis() as u64, "GET");

        let mut builder = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder
            .send()
            .map_err(|e| Self::map_send_error(e, request.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        resp.json::<serde_json::Value>().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    timeout_ms: request.timeout.as_millis() as u64,
                }
            } else {
                TransportError::Body(e.to_string())
            }
        })
    }

    fn head(&self, url: &str, timeout: Duration) -> Result<u16, TransportError> {
        tracing::debug!(url, timeout_ms = timeout.as_millis() as u64, "HEAD");
        let resp = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .map_err(|e| Self::map_send_error(e, timeout))?;
        Ok(resp.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_query_and_headers() {
        let req = HttpRequest::get("https://example.test/x", Duration::from_secs(1))
            .query("get", "NAME")
            .header("X-Trace", "1")
            .bearer(Some("secret"));
        assert_eq!(req.query, vec![("get".to_string(), "NAME".to_string())]);
        assert!(req
            .headers
            .contains(&("Authorization".to_string(), "Bearer secret".to_string())));
    }

    #[test]
    fn empty_bearer_token_is_skipped() {
        let req = HttpRequest::get("https://example.test", Duration::from_secs(1)).bearer(Some(""));
        assert!(req.headers.is_empty());
    }
}
