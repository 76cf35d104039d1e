//! Declarative conformance harness for an HTTP/JSON resource API.
//!
//! Catalogs generate [`catalog::Case`]s, the [`runner::Runner`] executes them
//! through a [`http::Transport`], [`validate::validate`] decides each verdict
//! and [`report`] turns outcomes into events and reports.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod http;
pub mod report;
pub mod resources;
pub mod runner;
pub mod validate;

pub use catalog::{Case, Catalog, CatalogError, default_catalogs};
pub use config::{ConfigError, HarnessConfig, Selection};
pub use http::{ReqwestTransport, ScriptedTransport, Transport};
pub use report::{EventSink, RecordingSink, TracingSink};
pub use runner::{RunResult, Runner};
pub use validate::{Validation, Verdict};
