use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::ReportError;
use crate::runner::{BurstStats, CaseRecord, RunResult, RunSummary};
use crate::validate::Verdict;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    schema_version: u32,
    started_at_ms: u64,
    finished_at_ms: u64,
    summary: &'a RunSummary,
    results: &'a [CaseRecord],
    bursts: &'a [BurstStats],
}

impl<'a> From<&'a RunResult> for RunReport<'a> {
    fn from(result: &'a RunResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            started_at_ms: result.started_at_ms,
            finished_at_ms: result.finished_at_ms,
            summary: &result.summary,
            results: &result.records,
            bursts: &result.bursts,
        }
    }
}

pub fn render_run_report(result: &RunResult) -> Result<String, ReportError> {
    serde_json::to_string_pretty(&RunReport::from(result)).map_err(ReportError::Serialize)
}

/// Writes the run as pretty JSON, creating parent directories as needed.
pub fn write_run_report(path: &Path, result: &RunResult) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &RunReport::from(result))
        .map_err(ReportError::Serialize)?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)
}

/// Human-readable summary: totals, then one line per failed or
/// inconclusive case.
pub fn render_text_summary(result: &RunResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} cases in {}ms: {} passed ({} tolerated), {} failed, {} inconclusive ({:.1}% pass rate)",
        summary.total,
        summary.duration_ms,
        summary.passed,
        summary.tolerated,
        summary.failed,
        summary.inconclusive,
        summary.pass_rate(),
    );

    for record in result.failures().chain(result.inconclusive()) {
        let detail = match &record.verdict {
            Verdict::Fail(reason) => reason.to_string(),
            Verdict::Inconclusive { kind } => kind.to_string(),
            Verdict::Pass { .. } => continue,
        };
        let _ = writeln!(
            out,
            "  {:<13} {} {} {} ({detail})",
            record.verdict.label(),
            record.case_id,
            record.method,
            record.url,
        );
    }

    for burst in &result.bursts {
        let _ = writeln!(
            out,
            "  BURST         {} x{}: p50 {}ms, p95 {}ms, max {}ms",
            burst.case_id, burst.requests, burst.p50_ms, burst.p95_ms, burst.max_ms,
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, ResponseSummary};
    use crate::runner::CaseOutcome;
    use crate::validate::{FailReason, TransportFailureKind};

    fn sample_result() -> RunResult {
        let mut result = RunResult::new(1_700_000_000_000);
        result.push(CaseRecord {
            case_id: "users-010".to_string(),
            label: "POST /users with empty body".to_string(),
            catalog: "users".to_string(),
            method: HttpMethod::Post,
            url: "https://fakestoreapi.com/users".to_string(),
            tags: vec!["users".to_string(), "create_empty_body".to_string()],
            sample: None,
            outcome: CaseOutcome::Response(ResponseSummary {
                status: 200,
                elapsed_ms: 120,
                content_type: "application/json".to_string(),
                body_bytes: 9,
            }),
            verdict: Verdict::Fail(FailReason::UnexpectedStatus {
                status: 200,
                expected: "{400,422,403}".to_string(),
            }),
            warnings: Vec::new(),
        });
        result.push(CaseRecord {
            case_id: "users-011".to_string(),
            label: "GET /users".to_string(),
            catalog: "users".to_string(),
            method: HttpMethod::Get,
            url: "https://fakestoreapi.com/users".to_string(),
            tags: vec!["users".to_string()],
            sample: None,
            outcome: CaseOutcome::TransportFailure {
                kind: TransportFailureKind::Timeout,
                message: "timeout: operation timed out".to_string(),
            },
            verdict: Verdict::Inconclusive {
                kind: TransportFailureKind::Timeout,
            },
            warnings: Vec::new(),
        });
        result.finished_at_ms = result.started_at_ms + 250;
        result.summary.duration_ms = 250;
        result
    }

    #[test]
    fn writes_report_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("nested").join("run.json");

        write_run_report(&path, &sample_result()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["inconclusive"], 1);
        assert_eq!(value["results"][0]["caseId"], "users-010");
        assert_eq!(value["results"][0]["verdict"]["detail"]["reason"], "unexpected_status");
        assert_eq!(value["results"][1]["outcome"]["kind"], "timeout");
        assert_eq!(value["bursts"], serde_json::json!([]));
    }

    #[test]
    fn report_path_must_be_writable() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_run_report(dir.path(), &sample_result()).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn text_summary_lists_failures_then_inconclusive() {
        let text = render_text_summary(&sample_result());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "2 cases in 250ms: 0 passed (0 tolerated), 1 failed, 1 inconclusive (0.0% pass rate)"
        );
        assert!(lines[1].contains("users-010 POST https://fakestoreapi.com/users"));
        assert!(lines[1].ends_with("(unexpected status 200 not in {400,422,403})"));
        assert!(lines[2].starts_with("  INCONCLUSIVE"));
        assert!(lines[2].ends_with("(timeout)"));
    }
}
