use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// What a transport hands back: raw status, headers and body.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed: Duration,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header("content-type", "application/json; charset=utf-8")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

/// The response of one executed case, as seen by the validator and reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedResponse {
    pub status: u16,
    pub elapsed_ms: u64,
    pub content_type: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub parsed_body: Option<Value>,
}

impl CapturedResponse {
    pub fn from_transport(response: TransportResponse) -> Self {
        let content_type = response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| "text/plain".to_string());
        let parsed_body = serde_json::from_str(&response.body).ok();
        let elapsed_ms = u64::try_from(response.elapsed.as_millis()).unwrap_or(u64::MAX);

        Self {
            status: response.status,
            elapsed_ms,
            content_type,
            headers: response.headers,
            body: response.body,
            parsed_body,
        }
    }

    pub fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            status: self.status,
            elapsed_ms: self.elapsed_ms,
            content_type: self.content_type.clone(),
            body_bytes: self.body.len(),
        }
    }
}

/// The part of a response that outlives the case in the run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub status: u16,
    pub elapsed_ms: u64,
    pub content_type: String,
    pub body_bytes: usize,
}
