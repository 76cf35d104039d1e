pub mod client;
pub mod executor;
pub mod method;
pub mod request;
pub mod response;
pub mod transport;

pub use client::ReqwestTransport;
pub use executor::RequestExecutor;
pub use method::HttpMethod;
pub use request::TransportRequest;
pub use response::{CapturedResponse, ResponseSummary, TransportResponse};
pub use transport::{ScriptedTransport, Transport, TransportError};
