use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use std::error::Error as _;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crate::config::HarnessConfig;

use super::request::TransportRequest;
use super::response::TransportResponse;
use super::transport::{Transport, TransportError};

/// [`Transport`] backed by a shared `reqwest` client.
///
/// The per-request timeout comes from the [`TransportRequest`]; proxy and
/// certificate settings are fixed when the client is built.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn from_config(config: &HarnessConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().redirect(reqwest::redirect::Policy::limited(10));

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            if !proxy_url.is_empty() {
                let proxy = Proxy::all(proxy_url)
                    .map_err(|err| TransportError::new(format!("Invalid proxy URL: {err}")))?;
                builder = builder.proxy(proxy);
            }
        }

        if !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|err| TransportError::new(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let headers = build_headers(&request.headers)?;
            let mut builder = self
                .client
                .request(request.method.into(), &request.url)
                .headers(headers)
                .timeout(request.timeout);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let start = Instant::now();
            let response = builder
                .send()
                .await
                .map_err(|err| TransportError::new(describe_reqwest_error(err)))?;

            let status = response.status().as_u16();
            let response_headers = format_headers(response.headers());
            let bytes = response.bytes().await.map_err(|err| {
                TransportError::new(format!(
                    "Failed to read response: {}",
                    describe_reqwest_error(err)
                ))
            })?;
            let elapsed = start.elapsed();

            Ok(TransportResponse {
                status,
                headers: response_headers,
                body: String::from_utf8_lossy(&bytes).into_owned(),
                elapsed,
            })
        })
    }
}

pub fn build_headers(input: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| TransportError::new(format!("Invalid header name `{key}`: {err}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            TransportError::new(format!("Invalid header value for `{key}`: {err}"))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

fn format_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            (name.to_string(), value.to_string())
        })
        .collect()
}

/// Flattens the error and its sources into one line, without the request URL
/// so a path or host cannot be mistaken for a cause. Timeouts get a `timeout:`
/// prefix because reqwest's own text does not always say so.
fn describe_reqwest_error(err: reqwest::Error) -> String {
    let timed_out = err.is_timeout();
    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    if timed_out {
        format!("timeout: {message}")
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::report::classify_transport_error;
    use crate::validate::TransportFailureKind;
    use std::time::Duration;
    use tokio::net::TcpListener;

    // Ignores proxy variables from the environment so loopback stays local.
    fn local_transport() -> ReqwestTransport {
        ReqwestTransport {
            client: Client::builder().no_proxy().build().unwrap(),
        }
    }

    fn get(url: String, timeout: Duration) -> TransportRequest {
        TransportRequest {
            method: HttpMethod::Get,
            url,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            timeout,
        }
    }

    #[test]
    fn build_headers_skips_empty_names() {
        let headers = build_headers(&[
            ("Accept".to_string(), "application/json".to_string()),
            (String::new(), "ignored".to_string()),
        ])
        .unwrap();

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["accept"], "application/json");
    }

    #[test]
    fn build_headers_rejects_invalid_names() {
        let err = build_headers(&[("bad header".to_string(), "x".to_string())]).unwrap_err();
        assert!(err.message.starts_with("Invalid header name `bad header`"));
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(ReqwestTransport::from_config(&HarnessConfig::default()).is_ok());
    }

    #[test]
    fn client_rejects_malformed_proxy() {
        let config = HarnessConfig {
            proxy_url: Some("http://[::1".to_string()),
            ..HarnessConfig::default()
        };
        let err = ReqwestTransport::from_config(&config).err().unwrap();
        assert!(err.message.starts_with("Invalid proxy URL"));
    }

    #[tokio::test]
    async fn refused_connection_is_classified_by_cause_not_url() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/tls-gateway/ssl/users/1");
        let err = local_transport()
            .send(get(url, Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(!err.message.contains("tls-gateway"), "{}", err.message);
        assert_eq!(
            classify_transport_error(&err.message),
            TransportFailureKind::ConnectionRefused,
            "{}",
            err.message
        );
    }

    #[tokio::test]
    async fn silent_server_is_classified_as_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let err = local_transport()
            .send(get(format!("http://{addr}/users/1"), Duration::from_millis(50)))
            .await
            .unwrap_err();
        server.abort();

        assert!(err.message.starts_with("timeout: "), "{}", err.message);
        assert_eq!(
            classify_transport_error(&err.message),
            TransportFailureKind::Timeout
        );
    }

    #[tokio::test]
    async fn send_captures_status_headers_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            let body = r#"{"id":1}"#;
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let response = local_transport()
            .send(get(format!("http://{addr}/users/1"), Duration::from_secs(5)))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"id":1}"#);
        assert!(
            response
                .headers
                .iter()
                .any(|(name, value)| name == "content-type" && value == "application/json")
        );
    }
}
