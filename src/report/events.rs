use serde::Serialize;

use crate::validate::TransportFailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Tolerated,
    Failed,
    Inconclusive,
}

/// What the engine tells a report backend. The run result is delivered
/// separately through [`super::EventSink::on_run_complete`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Step {
        case_id: String,
        label: String,
        status: StepStatus,
        message: String,
    },
    Attachment {
        /// `None` for run-level attachments such as burst statistics.
        case_id: Option<String>,
        name: String,
        content: String,
    },
    Diagnostic {
        case_id: String,
        kind: TransportFailureKind,
        message: String,
    },
    Warning {
        case_id: String,
        message: String,
    },
}

impl Event {
    pub fn case_id(&self) -> Option<&str> {
        match self {
            Event::Step { case_id, .. }
            | Event::Diagnostic { case_id, .. }
            | Event::Warning { case_id, .. } => Some(case_id),
            Event::Attachment { case_id, .. } => case_id.as_deref(),
        }
    }

    pub fn is_attachment(&self) -> bool {
        matches!(self, Event::Attachment { .. })
    }
}
