//! # Diagnostic Reporting
//!
//! The engine reports through [`EventSink`]: a step per case, a
//! "Failure Details" attachment per failed case, a classified diagnostic per
//! transport failure and a warning per soft-check miss. [`json`] turns the
//! final [`crate::runner::RunResult`] into files and text.

pub mod diagnostics;
pub mod events;
pub mod json;
pub mod sink;

pub use diagnostics::{
    DiagnosticReporter, FAILURE_DETAILS, PerformanceTier, classify_transport_error, excerpt,
    status_hint,
};
pub use events::{Event, StepStatus};
pub use json::{render_run_report, render_text_summary, write_run_report};
pub use sink::{EventSink, FanoutSink, RecordingSink, TracingSink};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize run report: {0}")]
    Serialize(#[source] serde_json::Error),
}
