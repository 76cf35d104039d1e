use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::catalog::case::is_placeholder;
use crate::catalog::{Case, HeaderPolicy};
use crate::config::{ConfigError, HarnessConfig};

use super::request::TransportRequest;
use super::response::CapturedResponse;
use super::transport::{Transport, TransportError};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Turns a case into one HTTP exchange. No caching and no retries.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl RequestExecutor {
    pub fn new(config: &HarnessConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            base_url: config.base_url()?,
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Joins the endpoint template onto the base URL. The `{name}`
    /// placeholder is replaced by `param`, percent-encoded as one segment.
    pub fn resolve_url(&self, endpoint: &str, param: Option<&str>) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::new(format!("Base URL `{}` cannot carry a path", self.base_url))
            })?;
            segments.pop_if_empty();

            for segment in endpoint.split('/').filter(|segment| !segment.is_empty()) {
                if is_placeholder(segment) {
                    let value = param.ok_or_else(|| {
                        TransportError::new(format!("No value for `{segment}` in `{endpoint}`"))
                    })?;
                    segments.push(value);
                } else {
                    segments.push(segment);
                }
            }
        }
        Ok(url)
    }

    pub fn build_request(&self, case: &Case) -> Result<TransportRequest, TransportError> {
        let url = self.resolve_url(&case.operation.endpoint, case.input.path_param())?;
        let body = case
            .input
            .body()
            .map_err(|err| TransportError::new(format!("Failed to encode request body: {err}")))?;

        let mut headers = Vec::with_capacity(3);
        if case.header_policy == HeaderPolicy::Json {
            headers.push(("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string()));
        }
        headers.push(("Accept".to_string(), JSON_MEDIA_TYPE.to_string()));
        headers.push(("User-Agent".to_string(), self.user_agent.clone()));

        Ok(TransportRequest {
            method: case.operation.method,
            url: url.into(),
            headers,
            body,
            timeout: self.timeout,
        })
    }

    pub async fn execute(&self, case: &Case) -> Result<CapturedResponse, TransportError> {
        let request = self.build_request(case)?;
        debug!(
            case = %case.id,
            method = %request.method,
            url = %request.url,
            "sending request"
        );
        let response = self.transport.send(request).await?;
        Ok(CapturedResponse::from_transport(response))
    }
}
