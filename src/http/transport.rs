use super::request::TransportRequest;
use super::response::TransportResponse;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::Mutex;

/// A request that never produced a response. The message carries the full
/// cause chain so it can be classified by text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends one HTTP request and returns the raw response.
///
/// The engine only ever talks to the network through this trait.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>>;
}

type Handler =
    Box<dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// In-memory transport for tests and dry runs.
///
/// Queued replies are consumed first, in order. Once the queue is empty the
/// handler answers; without a handler every request fails.
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    pub fn push(mut self, reply: Result<TransportResponse, TransportError>) -> Self {
        self.queue.get_mut().push_back(reply);
        self
    }

    pub fn respond(self, response: TransportResponse) -> Self {
        self.push(Ok(response))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(TransportError::new(message)))
    }

    /// Every request seen so far, in arrival order.
    pub async fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let queued = self.queue.lock().await.pop_front();
            let reply = match queued {
                Some(reply) => reply,
                None => match &self.handler {
                    Some(handler) => handler(&request),
                    None => Err(TransportError::new(format!(
                        "no scripted reply for {} {}",
                        request.method, request.url
                    ))),
                },
            };
            self.requests.lock().await.push(request);
            reply
        })
    }
}
