use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use super::events::{Event, StepStatus};
use crate::runner::RunResult;

/// Report backend. The engine only emits events; rendering is up to the sink.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);

    fn on_run_complete(&self, _result: &RunResult) {}
}

/// Writes every event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event {
            Event::Step {
                case_id,
                label,
                status,
                message,
            } => match status {
                StepStatus::Passed | StepStatus::Tolerated => {
                    info!(case = %case_id, ?status, "{label}: {message}")
                }
                StepStatus::Failed | StepStatus::Inconclusive => {
                    warn!(case = %case_id, ?status, "{label}: {message}")
                }
            },
            Event::Attachment {
                case_id,
                name,
                content,
            } => debug!(case = case_id.as_deref().unwrap_or("-"), attachment = %name, "\n{content}"),
            Event::Diagnostic {
                case_id,
                kind,
                message,
            } => warn!(case = %case_id, kind = %kind, "transport failure: {message}"),
            Event::Warning { case_id, message } => warn!(case = %case_id, "{message}"),
        }
    }

    fn on_run_complete(&self, result: &RunResult) {
        let summary = &result.summary;
        info!(
            total = summary.total,
            passed = summary.passed,
            tolerated = summary.tolerated,
            failed = summary.failed,
            inconclusive = summary.inconclusive,
            duration_ms = summary.duration_ms,
            "run completed"
        );
    }
}

/// Keeps everything in memory. Used by tests and by callers that render
/// their own report after the run.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
    result: Mutex<Option<RunResult>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_for(&self, case_id: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| event.case_id() == Some(case_id))
            .collect()
    }

    pub fn result(&self) -> Option<RunResult> {
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn on_run_complete(&self, result: &RunResult) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
    }
}

/// Forwards to several sinks in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: Event) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }

    fn on_run_complete(&self, result: &RunResult) {
        for sink in &self.sinks {
            sink.on_run_complete(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(case_id: &str) -> Event {
        Event::Warning {
            case_id: case_id.to_string(),
            message: "field token is missing".to_string(),
        }
    }

    #[test]
    fn recording_sink_filters_by_case() {
        let sink = RecordingSink::new();
        sink.emit(warning("auth-001"));
        sink.emit(warning("auth-002"));
        sink.emit(Event::Attachment {
            case_id: None,
            name: "Environment".to_string(),
            content: String::new(),
        });

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.events_for("auth-002"), vec![warning("auth-002")]);
    }

    #[test]
    fn fanout_delivers_to_every_sink() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new()
            .with(first.clone())
            .with(Arc::new(TracingSink))
            .with(second.clone());

        fanout.emit(warning("users-004"));
        assert_eq!(first.events(), vec![warning("users-004")]);
        assert_eq!(second.events(), vec![warning("users-004")]);
    }
}
