use std::fmt::{self, Display};
use std::sync::Arc;

use super::events::{Event, StepStatus};
use super::sink::EventSink;
use crate::catalog::Case;
use crate::http::{CapturedResponse, TransportError};
use crate::validate::{TransportFailureKind, Validation, Verdict};

pub const FAILURE_DETAILS: &str = "Failure Details";

const DNS_MARKERS: [&str; 5] = [
    "dns",
    "failed to lookup address",
    "unknownhost",
    "name or service not known",
    "no such host",
];

/// Maps a transport error's text to a failure kind. Checks run in order:
/// timeout, DNS, TLS, refused connection.
pub fn classify_transport_error(message: &str) -> TransportFailureKind {
    let message = message.to_ascii_lowercase();

    if message.contains("timeout") || message.contains("timed out") {
        return TransportFailureKind::Timeout;
    }
    if DNS_MARKERS.iter().any(|marker| message.contains(marker)) {
        return TransportFailureKind::DnsFailure;
    }
    if message.contains("tls") || message.contains("ssl") || message.contains("certificate") {
        return TransportFailureKind::TlsFailure;
    }
    if message.contains("connection refused") {
        return TransportFailureKind::ConnectionRefused;
    }

    TransportFailureKind::Unknown
}

/// Qualitative response-time bucket. Never affects a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Excellent,
    Acceptable,
    Slow,
    Poor,
}

impl PerformanceTier {
    pub fn from_elapsed_ms(elapsed_ms: u64) -> Self {
        match elapsed_ms {
            0..1_000 => PerformanceTier::Excellent,
            1_000..3_000 => PerformanceTier::Acceptable,
            3_000..10_000 => PerformanceTier::Slow,
            _ => PerformanceTier::Poor,
        }
    }
}

impl Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceTier::Excellent => "Excellent (< 1s)",
            PerformanceTier::Acceptable => "Acceptable (1-3s)",
            PerformanceTier::Slow => "Slow (3-10s)",
            PerformanceTier::Poor => "Poor (>= 10s)",
        };
        f.write_str(label)
    }
}

pub fn status_hint(status: u16) -> &'static str {
    match status {
        400 => "Bad Request: the request was invalid",
        401 => "Unauthorized: authentication required",
        403 => {
            "Forbidden: access denied, possibly rate limiting, API key requirements, \
             IP restrictions or API policy changes"
        }
        404 => "Not Found: resource not found",
        405 => "Method Not Allowed: HTTP method not supported",
        413 => "Payload Too Large: request body rejected by size",
        422 => "Unprocessable Entity: invalid data format",
        429 => "Too Many Requests: rate limit exceeded",
        500 => "Internal Server Error: server-side error",
        502 => "Bad Gateway: server communication error",
        503 => "Service Unavailable: server temporarily unavailable",
        _ => "Unexpected HTTP status",
    }
}

/// Longest prefix of `body` that fits in `limit` bytes without splitting a
/// character.
pub fn excerpt(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Turns one case outcome into report events.
pub struct DiagnosticReporter {
    sink: Arc<dyn EventSink>,
    excerpt_limit: usize,
}

impl DiagnosticReporter {
    pub fn new(sink: Arc<dyn EventSink>, excerpt_limit: usize) -> Self {
        Self {
            sink,
            excerpt_limit,
        }
    }

    /// Classifies a transport error into the validation the case is
    /// recorded with.
    pub fn transport_validation(&self, error: &TransportError) -> Validation {
        Validation::inconclusive(classify_transport_error(&error.message))
    }

    pub fn on_result(
        &self,
        case: &Case,
        url: &str,
        outcome: &Result<CapturedResponse, TransportError>,
        validation: &Validation,
    ) {
        match (outcome, &validation.verdict) {
            (Err(error), verdict) => {
                let kind = match verdict {
                    Verdict::Inconclusive { kind } => *kind,
                    _ => classify_transport_error(&error.message),
                };
                self.sink.emit(Event::Diagnostic {
                    case_id: case.id.clone(),
                    kind,
                    message: error.message.clone(),
                });
                self.step(case, StepStatus::Inconclusive, format!("{kind}: {}", error.message));
            }
            (Ok(response), Verdict::Fail(reason)) => {
                self.sink.emit(Event::Attachment {
                    case_id: Some(case.id.clone()),
                    name: FAILURE_DETAILS.to_string(),
                    content: self.failure_details(case, url, response),
                });
                self.step(case, StepStatus::Failed, reason.to_string());
            }
            (Ok(response), Verdict::Pass { tolerated }) => {
                let (status, message) = if *tolerated {
                    (
                        StepStatus::Tolerated,
                        format!(
                            "status {} tolerated ({})",
                            response.status,
                            status_hint(response.status)
                        ),
                    )
                } else {
                    (
                        StepStatus::Passed,
                        format!("status {} in {}ms", response.status, response.elapsed_ms),
                    )
                };
                self.step(case, status, message);
            }
            (Ok(_), Verdict::Inconclusive { kind }) => {
                self.step(case, StepStatus::Inconclusive, kind.to_string());
            }
        }

        for warning in &validation.warnings {
            self.sink.emit(Event::Warning {
                case_id: case.id.clone(),
                message: warning.clone(),
            });
        }
    }

    fn step(&self, case: &Case, status: StepStatus, message: String) {
        self.sink.emit(Event::Step {
            case_id: case.id.clone(),
            label: case.label.clone(),
            status,
            message,
        });
    }

    fn failure_details(&self, case: &Case, url: &str, response: &CapturedResponse) -> String {
        let body = excerpt(&response.body, self.excerpt_limit);
        let truncated = if body.len() < response.body.len() {
            format!(" (truncated, {} bytes total)", response.body.len())
        } else {
            String::new()
        };

        format!(
            "Operation: {label}\n\
             Request: {method} {url}\n\
             Expected Status: {expected}\n\
             Actual Status: {status}\n\
             Status Hint: {hint}\n\
             Response Time: {elapsed}ms\n\
             Performance: {tier}\n\
             Content Type: {content_type}\n\
             Response Body{truncated}: {body}",
            label = case.label,
            method = case.operation.method,
            expected = case.expectation.status_set(),
            status = response.status,
            hint = status_hint(response.status),
            elapsed = response.elapsed_ms,
            tier = PerformanceTier::from_elapsed_ms(response.elapsed_ms),
            content_type = response.content_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CaseInput, Expectation};
    use crate::http::{HttpMethod, TransportResponse};
    use crate::report::RecordingSink;
    use crate::validate::validate;
    use std::time::Duration;

    fn reporter(limit: usize) -> (DiagnosticReporter, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (DiagnosticReporter::new(sink.clone(), limit), sink)
    }

    fn empty_create() -> Case {
        Case::builder("users", "users-010", HttpMethod::Post, "/users")
            .label("POST /users with empty body")
            .input(CaseInput::RawBody("{}".to_string()))
            .expect(Expectation::codes([400, 422]).tolerate([403]))
            .build()
            .unwrap()
    }

    #[test]
    fn classifies_transport_errors_by_text() {
        let cases = [
            ("timeout: error sending request", TransportFailureKind::Timeout),
            ("operation timed out", TransportFailureKind::Timeout),
            (
                "error sending request: dns error: failed to lookup address information",
                TransportFailureKind::DnsFailure,
            ),
            ("java.net.UnknownHostException: api", TransportFailureKind::DnsFailure),
            ("invalid peer certificate: Expired", TransportFailureKind::TlsFailure),
            (
                "tcp connect error: Connection refused (os error 111)",
                TransportFailureKind::ConnectionRefused,
            ),
            ("connection reset by peer", TransportFailureKind::Unknown),
        ];
        for (message, expected) in cases {
            assert_eq!(classify_transport_error(message), expected, "{message}");
        }
    }

    #[test]
    fn performance_tiers() {
        assert_eq!(PerformanceTier::from_elapsed_ms(999), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_elapsed_ms(1_000), PerformanceTier::Acceptable);
        assert_eq!(PerformanceTier::from_elapsed_ms(3_000), PerformanceTier::Slow);
        assert_eq!(PerformanceTier::from_elapsed_ms(10_000), PerformanceTier::Poor);
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "h");
        assert_eq!(excerpt("héllo", 3), "hé");
        assert_eq!(excerpt("short", 64), "short");
    }

    #[test]
    fn failure_attaches_details_with_the_body_excerpt() {
        let (reporter, sink) = reporter(8);
        let case = empty_create();
        let response = CapturedResponse::from_transport(
            TransportResponse::json(200, r#"{"id":11,"username":null}"#)
                .with_elapsed(Duration::from_millis(1_200)),
        );
        let validation = validate(&case.expectation, &response);

        reporter.on_result(
            &case,
            "https://fakestoreapi.com/users",
            &Ok(response),
            &validation,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        let Event::Attachment { name, content, .. } = &events[0] else {
            panic!("expected an attachment, got {:?}", events[0]);
        };
        assert_eq!(name, FAILURE_DETAILS);
        assert!(content.contains("Request: POST https://fakestoreapi.com/users"));
        assert!(content.contains("Expected Status: {400,422,403}"));
        assert!(content.contains("Actual Status: 200"));
        assert!(content.contains("Performance: Acceptable (1-3s)"));
        assert!(content.ends_with(r#"Response Body (truncated, 25 bytes total): {"id":11"#));
        assert!(matches!(
            &events[1],
            Event::Step { status: StepStatus::Failed, message, .. }
                if message == "unexpected status 200 not in {400,422,403}"
        ));
    }

    #[test]
    fn pass_emits_a_single_step() {
        let (reporter, sink) = reporter(2048);
        let case = Case::builder("users", "users-002", HttpMethod::Get, "/users/{id}")
            .input(CaseInput::PathParam("1".to_string()))
            .expect(Expectation::get_by_id())
            .build()
            .unwrap();
        let response = CapturedResponse::from_transport(TransportResponse::json(200, r#"{"id":1}"#));
        let validation = validate(&case.expectation, &response);

        reporter.on_result(&case, "https://fakestoreapi.com/users/1", &Ok(response), &validation);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::Step {
                status: StepStatus::Passed,
                ..
            }
        ));
    }

    #[test]
    fn transport_errors_emit_a_diagnostic() {
        let (reporter, sink) = reporter(2048);
        let case = empty_create();
        let error = TransportError::new("timeout: operation timed out");
        let validation = reporter.transport_validation(&error);
        assert_eq!(
            validation.verdict,
            Verdict::Inconclusive {
                kind: TransportFailureKind::Timeout
            }
        );

        reporter.on_result(&case, "https://fakestoreapi.com/users", &Err(error), &validation);

        let events = sink.events();
        assert!(matches!(
            &events[0],
            Event::Diagnostic {
                kind: TransportFailureKind::Timeout,
                ..
            }
        ));
        assert!(!events.iter().any(Event::is_attachment));
    }
}
